/// Store Construction
///
/// Fresh stores for a new installation or a reset without baseline.

use serde::{Deserialize, Serialize};

use crate::domain::{TankId, TankStatus, Tank, TankStore};
use crate::error::{EngineError, Rejection};
use crate::invariants::validate_tanks;

/// Fleet entry: a tank and its fixed capacity in litres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TankSpec {
    pub name: TankId,
    pub capacity: u32,
}

/// Capacities of the brewhouse as installed.
pub fn default_fleet() -> Vec<TankSpec> {
    [
        (TankId::A, 1000),
        (TankId::B, 800),
        (TankId::C, 1000),
        (TankId::D, 800),
        (TankId::E, 1000),
        (TankId::F, 800),
        (TankId::G, 680),
        (TankId::H, 680),
        (TankId::R, 1000),
    ]
    .into_iter()
    .map(|(name, capacity)| TankSpec { name, capacity })
    .collect()
}

/// Create a tank store with every tank Idle, empty and unassigned.
///
/// The fleet may be listed in any order; the store is kept in scan
/// order. Missing, duplicate or zero-capacity tanks are rejected.
pub fn create_initial_tanks(fleet: &[TankSpec]) -> Result<TankStore, EngineError> {
    let mut tanks: Vec<Tank> = fleet
        .iter()
        .map(|spec| Tank {
            name: spec.name,
            status: TankStatus::Idle,
            beer: None,
            current_volume: 0,
            capacity: spec.capacity,
            fermentation_start: None,
        })
        .collect();
    tanks.sort_by_key(|t| t.name);

    let store = TankStore { tanks };
    validate_tanks(&store).map_err(Rejection::Invariant)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fleet_builds_nine_idle_tanks() {
        let store = create_initial_tanks(&default_fleet()).unwrap();
        assert_eq!(store.tanks.len(), 9);
        assert!(store.tanks.iter().all(|t| t.is_empty_idle()));
        assert_eq!(store.get(TankId::G).unwrap().capacity, 680);
    }

    #[test]
    fn fleet_order_is_normalized() {
        let mut fleet = default_fleet();
        fleet.reverse();
        let store = create_initial_tanks(&fleet).unwrap();
        let names: Vec<TankId> = store.tanks.iter().map(|t| t.name).collect();
        assert_eq!(names, TankId::ALL.to_vec());
    }

    #[test]
    fn incomplete_fleet_is_rejected() {
        let fleet: Vec<TankSpec> = default_fleet().into_iter().skip(1).collect();
        let err = create_initial_tanks(&fleet).unwrap_err();
        assert!(err.to_string().contains("fleet_complete"), "{}", err);
    }
}
