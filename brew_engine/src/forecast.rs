/// Demand Forecast
///
/// Weekly mean of historical sales across every year on record.

use std::fmt;

use crate::arithmetic::mean_half_even;
use crate::calendar::{rolling_window, WEEKS_PER_YEAR};
use crate::domain::{Beer, PerBeer};
use crate::error::EngineError;
use crate::ledger::SalesLedger;

/// Mean sales per beer for each week `1..=52`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandForecast {
    weeks: Vec<PerBeer<u64>>,
}

impl DemandForecast {
    /// Forecast for `week` (1-based, clamped into range).
    pub fn week(&self, week: u8) -> &PerBeer<u64> {
        let slot = week.clamp(1, WEEKS_PER_YEAR) as usize - 1;
        &self.weeks[slot]
    }

    /// Per-beer total over `width` weeks starting at `start`, wrapping 52 -> 1.
    pub fn window_total(&self, start: u8, width: u8) -> Result<PerBeer<u64>, EngineError> {
        let mut total: PerBeer<u64> = PerBeer::default();
        for week in rolling_window(start, width) {
            for (beer, demand) in self.week(week).iter() {
                let slot = total.get_mut(beer);
                *slot = slot.checked_add(*demand).ok_or_else(|| {
                    EngineError::Overflow(format!("{} demand over window overflows", beer))
                })?;
            }
        }
        Ok(total)
    }
}

impl fmt::Display for DemandForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", "week")?;
        for beer in Beer::ALL {
            write!(f, " {:>20}", beer.name())?;
        }
        writeln!(f)?;
        for (i, demand) in self.weeks.iter().enumerate() {
            write!(f, "{:>6}", i + 1)?;
            for (_, n) in demand.iter() {
                write!(f, " {:>20}", n)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Average each week's yearly records.
///
/// Weeks without records forecast zero. Returns `None` when the ledger
/// holds no records at all: there is no sales history to plan from.
pub fn compute_forecast(ledger: &SalesLedger) -> Result<Option<DemandForecast>, EngineError> {
    if ledger.is_empty() {
        return Ok(None);
    }

    let mut weeks = Vec::with_capacity(WEEKS_PER_YEAR as usize);
    for week in 1..=WEEKS_PER_YEAR {
        let records = ledger.week(week);
        let mut totals: PerBeer<u64> = PerBeer::default();
        for record in records {
            for (beer, count) in record.counts.iter() {
                let slot = totals.get_mut(beer);
                *slot = slot.checked_add(*count).ok_or_else(|| {
                    EngineError::Overflow(format!("week {} {} sales total overflows", week, beer))
                })?;
            }
        }
        let years = records.len() as u64;
        weeks.push(PerBeer::from_fn(|beer| mean_half_even(*totals.get(beer), years)));
    }

    Ok(Some(DemandForecast { weeks }))
}
