/// Tank Invariant Checks
///
/// Run after every transition and whenever a tank store is loaded.
/// Returns `Err(message)` on the first failure.

use std::collections::BTreeSet;

use crate::domain::{TankId, TankStatus, TankStore};

/// Run all tank checks in order.
pub fn validate_tanks(store: &TankStore) -> Result<(), String> {
    check_fleet_complete(store)?;
    check_positive_capacity(store)?;
    check_volume_within_capacity(store)?;
    check_r_never_conditions(store)?;
    check_gh_never_ferment(store)?;
    check_fermentation_start_only_on_r(store)?;
    Ok(())
}

/// Every tank in the fixed set appears exactly once.
fn check_fleet_complete(store: &TankStore) -> Result<(), String> {
    let mut seen: BTreeSet<TankId> = BTreeSet::new();
    for tank in &store.tanks {
        if !seen.insert(tank.name) {
            return Err(format!(
                "[INVARIANT:fleet_complete] Tank {} appears more than once",
                tank.name
            ));
        }
    }
    if let Some(missing) = TankId::ALL.iter().find(|id| !seen.contains(*id)) {
        return Err(format!(
            "[INVARIANT:fleet_complete] Tank {} is missing from the fleet",
            missing
        ));
    }
    Ok(())
}

fn check_positive_capacity(store: &TankStore) -> Result<(), String> {
    for tank in &store.tanks {
        if tank.capacity == 0 {
            return Err(format!(
                "[INVARIANT:positive_capacity] Tank {} has zero capacity",
                tank.name
            ));
        }
    }
    Ok(())
}

fn check_volume_within_capacity(store: &TankStore) -> Result<(), String> {
    for tank in &store.tanks {
        if tank.current_volume > tank.capacity {
            return Err(format!(
                "[INVARIANT:volume_capacity] Tank {} holds {} L but its capacity is {} L",
                tank.name, tank.current_volume, tank.capacity
            ));
        }
    }
    Ok(())
}

fn check_r_never_conditions(store: &TankStore) -> Result<(), String> {
    for tank in &store.tanks {
        if tank.name.ferments_only() && tank.status == TankStatus::Conditioning {
            return Err(format!(
                "[INVARIANT:ferment_only] Tank {} is Conditioning",
                tank.name
            ));
        }
    }
    Ok(())
}

fn check_gh_never_ferment(store: &TankStore) -> Result<(), String> {
    for tank in &store.tanks {
        if tank.name.conditions_only()
            && matches!(
                tank.status,
                TankStatus::Fermenting | TankStatus::FinishedFermenting
            )
        {
            return Err(format!(
                "[INVARIANT:condition_only] Tank {} is {}",
                tank.name, tank.status
            ));
        }
    }
    Ok(())
}

fn check_fermentation_start_only_on_r(store: &TankStore) -> Result<(), String> {
    for tank in &store.tanks {
        if !tank.name.ferments_only() && tank.fermentation_start.is_some() {
            return Err(format!(
                "[INVARIANT:fermentation_start] Tank {} carries a fermentation start date",
                tank.name
            ));
        }
    }
    Ok(())
}
