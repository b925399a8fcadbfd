/// Beer Level Aggregation
///
/// Merges bottled stock, in-process tank volume and forecast demand into
/// one table per beer. All volumes are fixed-point litres.

use std::fmt;

use chrono::NaiveDate;

use crate::arithmetic::{bottles_to_litres, checked_add, checked_sub, format_fixed, litres};
use crate::calendar::{week_of_year, FORECAST_WINDOW_WEEKS};
use crate::domain::{Beer, PerBeer, TankStatus, TankStore};
use crate::error::EngineError;
use crate::forecast::DemandForecast;
use crate::inventory::BottledInventory;

/// Stock and demand for one beer (fixed-point litres).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeerLevel {
    pub on_hand: i64,
    pub in_process: i64,
    pub need: i64,
}

impl BeerLevel {
    /// `need - (on_hand + in_process)`. Negative means surplus.
    pub fn deficit(&self) -> Result<i64, EngineError> {
        checked_sub(self.need, checked_add(self.on_hand, self.in_process)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeerLevels {
    /// Week the demand window starts at.
    pub current_week: u8,
    levels: PerBeer<BeerLevel>,
}

impl BeerLevels {
    pub fn get(&self, beer: Beer) -> &BeerLevel {
        self.levels.get(beer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Beer, &BeerLevel)> {
        self.levels.iter()
    }

    /// Count `capacity` litres of `beer` as in process.
    pub fn credit_in_process(&mut self, beer: Beer, capacity: u32) -> Result<(), EngineError> {
        let level = self.levels.get_mut(beer);
        level.in_process = checked_add(level.in_process, litres(u64::from(capacity))?)?;
        Ok(())
    }
}

impl fmt::Display for BeerLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BEER LEVELS (litres, {}-week window from week {}):",
            FORECAST_WINDOW_WEEKS, self.current_week
        )?;
        for (beer, level) in self.iter() {
            write!(
                f,
                "{:<20} on hand {:>8}  in process {:>8}  need {:>8}",
                beer.name(),
                format_fixed(level.on_hand),
                format_fixed(level.in_process),
                format_fixed(level.need),
            )?;
            match level.deficit() {
                Ok(d) => writeln!(f, "  deficit {:>8}", format_fixed(d))?,
                Err(_) => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Build the per-beer table for `today`.
///
/// `None` forecast (no sales history) yields `None`.
pub fn aggregate(
    inventory: &BottledInventory,
    tanks: &TankStore,
    forecast: Option<&DemandForecast>,
    today: NaiveDate,
) -> Result<Option<BeerLevels>, EngineError> {
    let Some(forecast) = forecast else {
        return Ok(None);
    };

    let mut levels: PerBeer<BeerLevel> = PerBeer::default();

    for (beer, bottles) in inventory.iter() {
        levels.get_mut(beer).on_hand = bottles_to_litres(bottles)?;
    }

    for tank in &tanks.tanks {
        if tank.status == TankStatus::Idle {
            continue;
        }
        // A busy tank with no beer recorded has nothing to count.
        if let Some(beer) = tank.beer {
            let level = levels.get_mut(beer);
            level.in_process =
                checked_add(level.in_process, litres(u64::from(tank.current_volume))?)?;
        }
    }

    let current_week = week_of_year(today);
    let demand = forecast.window_total(current_week, FORECAST_WINDOW_WEEKS)?;
    for (beer, total) in demand.iter() {
        levels.get_mut(beer).need = litres(*total)?;
    }

    Ok(Some(BeerLevels {
        current_week,
        levels,
    }))
}
