/// Planning Pipeline
///
/// forecast -> aggregate -> recommend over one consistent view of the
/// three stores. Stateless: every call recomputes from its arguments.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::TankStore;
use crate::error::EngineError;
use crate::forecast::{compute_forecast, DemandForecast};
use crate::inventory::BottledInventory;
use crate::ledger::SalesLedger;
use crate::levels::{aggregate, BeerLevels};
use crate::recommend::{recommend, Recommendations};

/// Borrowed view of the stores a plan is computed from.
///
/// `ledger` is `None` when the sales store could not be read; the plan
/// then degrades to the no-history message.
#[derive(Debug, Clone, Copy)]
pub struct BreweryView<'a> {
    pub ledger: Option<&'a SalesLedger>,
    pub tanks: &'a TankStore,
    pub inventory: &'a BottledInventory,
}

/// Everything one planning pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub forecast: Option<DemandForecast>,
    pub levels: Option<BeerLevels>,
    pub recommendations: Recommendations,
}

impl<'a> BreweryView<'a> {
    pub fn forecast(&self) -> Result<Option<DemandForecast>, EngineError> {
        match self.ledger {
            Some(ledger) => compute_forecast(ledger),
            None => Ok(None),
        }
    }

    pub fn beer_levels(&self, now: NaiveDateTime) -> Result<Option<BeerLevels>, EngineError> {
        let forecast = self.forecast()?;
        aggregate(self.inventory, self.tanks, forecast.as_ref(), now.date())
    }

    /// Run the full pipeline at `now`.
    pub fn plan(&self, now: NaiveDateTime) -> Result<Plan, EngineError> {
        let forecast = self.forecast()?;
        let levels = aggregate(self.inventory, self.tanks, forecast.as_ref(), now.date())?;
        let recommendations = recommend(self.tanks, levels.as_ref(), now)?;
        debug!(
            has_history = forecast.is_some(),
            instructions = recommendations.0.len(),
            "plan computed"
        );
        Ok(Plan {
            forecast,
            levels,
            recommendations,
        })
    }
}
