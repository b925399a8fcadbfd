/// Tank Transitions
///
/// The only way a tank changes. The input store is never mutated:
/// a copy is made, changed, re-validated and returned.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{Beer, Tank, TankId, TankStatus, TankStore};
use crate::error::{EngineError, Rejection};
use crate::invariants::validate_tanks;

/// Requested new state for one tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TankUpdate {
    pub name: TankId,
    pub status: TankStatus,
    pub beer: Option<Beer>,
    pub volume: u32,
}

/// Validate `update` against the fleet and return the new store.
///
/// Checks, in order: volume within capacity, R never conditions,
/// G and H never ferment. `now` stamps R's fermentation start.
pub fn apply_transition(
    store: &TankStore,
    update: &TankUpdate,
    now: NaiveDateTime,
) -> Result<TankStore, EngineError> {
    let current = store
        .get(update.name)
        .ok_or(Rejection::UnknownTank(update.name))?;
    check_update(current, update)?;

    let mut next = store.clone();
    let tank = next
        .get_mut(update.name)
        .ok_or(Rejection::UnknownTank(update.name))?;
    tank.status = update.status;
    tank.beer = update.beer;
    tank.current_volume = update.volume;
    if tank.name.ferments_only() {
        tank.fermentation_start = match update.status {
            TankStatus::Fermenting => Some(now),
            _ => None,
        };
    }

    validate_tanks(&next).map_err(Rejection::Invariant)?;

    debug!(
        tank = %update.name,
        status = %update.status,
        volume = update.volume,
        "tank transition applied"
    );
    Ok(next)
}

fn check_update(current: &Tank, update: &TankUpdate) -> Result<(), Rejection> {
    if update.volume > current.capacity {
        return Err(Rejection::VolumeExceedsCapacity {
            tank: current.name,
            volume: update.volume,
            capacity: current.capacity,
        });
    }
    if current.name.ferments_only() && update.status == TankStatus::Conditioning {
        return Err(Rejection::FermentOnly);
    }
    if current.name.conditions_only()
        && matches!(
            update.status,
            TankStatus::Fermenting | TankStatus::FinishedFermenting
        )
    {
        return Err(Rejection::ConditionOnly(current.name));
    }
    Ok(())
}
