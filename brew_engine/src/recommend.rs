/// Recommendation Engine
///
/// Step 1 decides what finished tanks should do (condition in place,
/// move R into G/H, or divert another tank into G/H while R is still
/// young). Step 2 fills idle tanks, largest first, each with the beer
/// whose 8-week deficit is largest at that point.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{Beer, Tank, TankId, TankStatus, TankStore};
use crate::error::EngineError;
use crate::levels::BeerLevels;

/// R must have fermented this many days before G/H are held for it.
pub const R_MIN_FERMENT_DAYS: i64 = 14;

/// Days R is assumed to have fermented when no start date is recorded.
pub const R_ASSUMED_FERMENT_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// R is young: condition `from` in G and H instead of waiting.
    DivertToConditioning { from: TankId },
    /// R has finished; `ready` when G and H are empty and idle.
    MoveRIntoConditioning { ready: bool },
    ConditionInPlace { tank: TankId },
    /// Every beer already covers its 8-week need.
    SufficientStock,
    Fill { tank: TankId, beer: Beer },
    NoSalesHistory,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::DivertToConditioning { from } => write!(
                f,
                "Tank R should be fermenting for at least another 2 weeks, so move \
                 Tank {}'s contents into Tanks G and H for conditioning.",
                from
            ),
            Recommendation::MoveRIntoConditioning { ready: true } => write!(
                f,
                "Tank R can be moved into Tanks G and H for conditioning."
            ),
            Recommendation::MoveRIntoConditioning { ready: false } => write!(
                f,
                "Tanks G and H should have almost finished conditioning, so Tank R's \
                 contents can be moved into them."
            ),
            Recommendation::ConditionInPlace { tank } => write!(
                f,
                "Tank {} should be conditioned in the tank it is currently in.",
                tank
            ),
            Recommendation::SufficientStock => write!(
                f,
                "From this point, you have enough beer brewed for the next 8 weeks."
            ),
            Recommendation::Fill { tank, beer } => {
                write!(f, "Tank {} should be filled with {} next.", tank, beer)
            }
            Recommendation::NoSalesHistory => write!(
                f,
                "No previous sales information entered into the system, so no \
                 recommendations can be made. Please append a sales file."
            ),
        }
    }
}

/// Ordered instructions, one per line when displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recommendations(pub Vec<Recommendation>);

impl Recommendations {
    pub fn iter(&self) -> std::slice::Iter<'_, Recommendation> {
        self.0.iter()
    }

    pub fn is_no_history(&self) -> bool {
        self.0 == [Recommendation::NoSalesHistory]
    }
}

impl fmt::Display for Recommendations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rec in &self.0 {
            writeln!(f, "{}", rec)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Step 1: conditioning
// ---------------------------------------------------------------------------

/// Result of the conditioning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditioningPlan {
    /// Tank to move into G/H while R keeps fermenting.
    pub divert: Option<TankId>,
    /// Finished tanks still to be handled, scan order.
    pub finished: Vec<TankId>,
    /// Idle tanks plus the diverted tank, scan order.
    pub idle: Vec<TankId>,
}

/// Whether R started fermenting less than two weeks before `now`.
pub fn r_is_young(tanks: &TankStore, now: NaiveDateTime) -> bool {
    let days = tanks
        .get(TankId::R)
        .and_then(|r| r.fermentation_start)
        .map(|start| (now - start).num_days())
        .unwrap_or(R_ASSUMED_FERMENT_DAYS);
    days < R_MIN_FERMENT_DAYS
}

fn gh_empty_idle(tanks: &TankStore) -> bool {
    [TankId::G, TankId::H]
        .iter()
        .all(|id| tanks.get(*id).map(Tank::is_empty_idle).unwrap_or(false))
}

/// Partition finished and idle tanks and decide the G/H divert.
///
/// The divert picks the fullest finished tank other than R; the first
/// tank in scan order wins a tie.
pub fn plan_conditioning(tanks: &TankStore, now: NaiveDateTime) -> ConditioningPlan {
    let mut finished: Vec<&Tank> = tanks.with_status(TankStatus::FinishedFermenting);
    let mut idle: Vec<TankId> = tanks
        .with_status(TankStatus::Idle)
        .iter()
        .map(|t| t.name)
        .collect();

    let mut divert = None;
    if r_is_young(tanks, now) && gh_empty_idle(tanks) {
        let mut best: Option<&Tank> = None;
        for tank in finished.iter().copied().filter(|t| t.name != TankId::R) {
            if best.map_or(true, |b| tank.current_volume > b.current_volume) {
                best = Some(tank);
            }
        }
        if let Some(best) = best {
            debug!(tank = %best.name, volume = best.current_volume, "diverting into G/H");
            finished.retain(|t| t.name != best.name);
            idle.push(best.name);
            divert = Some(best.name);
        }
    }

    ConditioningPlan {
        divert,
        finished: finished.iter().map(|t| t.name).collect(),
        idle,
    }
}

// ---------------------------------------------------------------------------
// Step 2: filling
// ---------------------------------------------------------------------------

/// Beer with the largest deficit, ties to the earliest in priority order.
pub fn next_beer(levels: &BeerLevels) -> Result<(Beer, i64), EngineError> {
    let mut best: Option<(Beer, i64)> = None;
    for (beer, level) in levels.iter() {
        let deficit = level.deficit()?;
        if best.map_or(true, |(_, top)| deficit > top) {
            best = Some((beer, deficit));
        }
    }
    // PerBeer always has three entries.
    Ok(best.unwrap_or((Beer::Pilsner, 0)))
}

/// Produce the ordered instructions for the current tank state.
///
/// `levels` of `None` (no sales history) discards everything else and
/// returns only the no-history message.
pub fn recommend(
    tanks: &TankStore,
    levels: Option<&BeerLevels>,
    now: NaiveDateTime,
) -> Result<Recommendations, EngineError> {
    let Some(levels) = levels else {
        return Ok(Recommendations(vec![Recommendation::NoSalesHistory]));
    };

    let plan = plan_conditioning(tanks, now);
    let mut out = Vec::new();

    if let Some(from) = plan.divert {
        out.push(Recommendation::DivertToConditioning { from });
    }
    for name in &plan.finished {
        if name.ferments_only() {
            out.push(Recommendation::MoveRIntoConditioning {
                // A divert has already claimed G and H.
                ready: plan.divert.is_none() && gh_empty_idle(tanks),
            });
        } else {
            out.push(Recommendation::ConditionInPlace { tank: *name });
        }
    }

    let mut idle: Vec<&Tank> = plan.idle.iter().filter_map(|id| tanks.get(*id)).collect();
    // Stable: equal capacities keep scan order.
    idle.sort_by(|a, b| b.capacity.cmp(&a.capacity));

    let mut running = levels.clone();
    let mut surplus_noted = false;
    for tank in idle {
        let (beer, deficit) = next_beer(&running)?;
        if deficit < 0 && !surplus_noted {
            out.push(Recommendation::SufficientStock);
            surplus_noted = true;
        }
        debug!(tank = %tank.name, beer = %beer, deficit, "idle tank assigned");
        out.push(Recommendation::Fill {
            tank: tank.name,
            beer,
        });
        running.credit_in_process(beer, tank.capacity)?;
    }

    Ok(Recommendations(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_initial_tanks, default_fleet};
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fleet() -> TankStore {
        create_initial_tanks(&default_fleet()).unwrap()
    }

    fn set(store: &mut TankStore, id: TankId, status: TankStatus, beer: Beer, volume: u32) {
        let tank = store.get_mut(id).unwrap();
        tank.status = status;
        tank.beer = Some(beer);
        tank.current_volume = volume;
    }

    /// Every non-G/H tank busy, so step 2 only sees what a test frees.
    fn busy_fleet() -> TankStore {
        let mut store = fleet();
        for id in [TankId::A, TankId::B, TankId::C, TankId::D, TankId::E, TankId::F] {
            set(&mut store, id, TankStatus::Fermenting, Beer::Pilsner, 100);
        }
        set(&mut store, TankId::R, TankStatus::Fermenting, Beer::Dunkel, 100);
        store
    }

    #[test]
    fn young_r_diverts_largest_finished_tank() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        set(&mut store, TankId::D, TankStatus::FinishedFermenting, Beer::Pilsner, 750);
        set(&mut store, TankId::F, TankStatus::FinishedFermenting, Beer::Pilsner, 750);
        store.get_mut(TankId::R).unwrap().fermentation_start = Some(now() - Duration::days(3));

        let plan = plan_conditioning(&store, now());
        assert_eq!(plan.divert, Some(TankId::D), "first of the tied maxima wins");
        assert_eq!(plan.finished, vec![TankId::B, TankId::F]);
        assert_eq!(plan.idle, vec![TankId::G, TankId::H, TankId::D]);
    }

    #[test]
    fn old_r_does_not_divert() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        store.get_mut(TankId::R).unwrap().fermentation_start = Some(now() - Duration::days(14));

        let plan = plan_conditioning(&store, now());
        assert_eq!(plan.divert, None);
        assert_eq!(plan.finished, vec![TankId::B]);
    }

    #[test]
    fn unset_start_counts_as_one_week() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        assert!(store.get(TankId::R).unwrap().fermentation_start.is_none());
        assert!(r_is_young(&store, now()));
        assert_eq!(plan_conditioning(&store, now()).divert, Some(TankId::B));
    }

    #[test]
    fn occupied_g_blocks_divert() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        store.get_mut(TankId::G).unwrap().current_volume = 10;
        assert_eq!(plan_conditioning(&store, now()).divert, None);
    }

    #[test]
    fn no_levels_returns_only_no_history_message() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        let recs = recommend(&store, None, now()).unwrap();
        assert!(recs.is_no_history());
        assert_eq!(recs.0.len(), 1);
    }

    #[test]
    fn finished_r_message_depends_on_gh() {
        let mut store = busy_fleet();
        set(&mut store, TankId::R, TankStatus::FinishedFermenting, Beer::Dunkel, 900);
        set(&mut store, TankId::G, TankStatus::Conditioning, Beer::Pilsner, 600);
        let plan = plan_conditioning(&store, now());
        assert_eq!(plan.finished, vec![TankId::R]);
        assert!(!gh_empty_idle(&store));
    }

    #[test]
    fn finished_r_without_start_still_allows_divert() {
        let mut store = busy_fleet();
        set(&mut store, TankId::B, TankStatus::FinishedFermenting, Beer::Pilsner, 700);
        set(&mut store, TankId::R, TankStatus::FinishedFermenting, Beer::Dunkel, 900);
        assert!(store.get(TankId::R).unwrap().fermentation_start.is_none());

        let plan = plan_conditioning(&store, now());
        assert_eq!(plan.divert, Some(TankId::B));
        assert_eq!(plan.finished, vec![TankId::R]);

        let levels = {
            use crate::inventory::BottledInventory;
            use crate::levels::aggregate;
            use crate::ledger::{ingest, SalesLedger};
            let rows = vec![vec!["INV", "", "05-Mar-19", "Organic Pilsner", "", "1"]];
            let (ledger, _) = ingest(&SalesLedger::new(), &rows).unwrap();
            let forecast = crate::forecast::compute_forecast(&ledger).unwrap();
            aggregate(&BottledInventory::new(), &store, forecast.as_ref(), now().date())
                .unwrap()
                .unwrap()
        };
        let recs = recommend(&store, Some(&levels), now()).unwrap();
        assert_eq!(
            recs.0[..2],
            [
                Recommendation::DivertToConditioning { from: TankId::B },
                Recommendation::MoveRIntoConditioning { ready: false },
            ]
        );
    }
}
