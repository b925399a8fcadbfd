//! Brewhouse: the shell-facing API over one store set.
//!
//! Every mutating call follows the same order:
//!   1. load the stores it needs
//!   2. run the kernel operation on the loaded copy
//!   3. persist the result, only if step 2 succeeded
//!
//! Planning calls never write. A missing or unreadable sales store is
//! not an error for them: the plan degrades to the no-history message.
//! `*_at` variants take "now" explicitly; the plain ones read the clock.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use brew_engine::domain::{Beer, TankStore};
use brew_engine::engine::{BreweryView, Plan};
use brew_engine::forecast::DemandForecast;
use brew_engine::inventory::{adjust_bottle_count, Adjustment, BottledInventory};
use brew_engine::ledger::{ingest, IngestSummary, SalesLedger};
use brew_engine::levels::BeerLevels;
use brew_engine::recommend::Recommendations;
use brew_engine::state::TankSpec;
use brew_engine::transitions::{apply_transition, TankUpdate};

use crate::baseline::{self, ResetSource};
use crate::config::RuntimeConfig;
use crate::error::{BrewError, StoreKind};
use crate::sales_csv::read_sales_file;
use crate::store::{StoreSet, Stores};

pub struct Brewhouse {
    stores: StoreSet,
    baseline_dir: PathBuf,
    fleet: Vec<TankSpec>,
}

impl Brewhouse {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            stores: StoreSet::new(&config.data_dir),
            baseline_dir: config.baseline_dir(),
            fleet: config.fleet.clone(),
        }
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub fn baseline_dir(&self) -> &Path {
        &self.baseline_dir
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    /// The ledger, or None when the sales store can't be read.
    fn ledger_or_none(&self) -> Option<SalesLedger> {
        match self.stores.load_ledger() {
            Ok(ledger) => Some(ledger),
            Err(e) => {
                warn!(error = %e, "sales history unavailable");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sales
    // -----------------------------------------------------------------------

    /// Fold the CSV at `csv_path` into the ledger.
    ///
    /// Nothing is written unless every row parses. With `commit` false
    /// the summary is computed and the ledger left alone. A ledger file
    /// that does not exist yet starts empty; one that exists but cannot
    /// be decoded is an error rather than being overwritten.
    pub fn ingest_sales(&self, csv_path: &Path, commit: bool) -> Result<IngestSummary, BrewError> {
        let rows = read_sales_file(csv_path)?;
        let ledger = if self.stores.exists(StoreKind::Sales) {
            self.stores.load_ledger()?
        } else {
            warn!("no sales store yet, starting an empty ledger");
            SalesLedger::new()
        };

        let (next, summary) = ingest(&ledger, &rows)?;
        if commit {
            self.stores.save_ledger(&next)?;
        }
        info!(
            file = %csv_path.display(),
            rows = summary.rows_ingested,
            committed = commit,
            "sales file ingested"
        );
        Ok(summary)
    }

    /// `Ok(None)` when there is no readable sales history.
    pub fn compute_forecast(&self) -> Result<Option<DemandForecast>, BrewError> {
        match self.ledger_or_none() {
            Some(ledger) => Ok(brew_engine::forecast::compute_forecast(&ledger)?),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Tanks and bottles
    // -----------------------------------------------------------------------

    pub fn apply_tank_transition(&self, update: &TankUpdate) -> Result<TankStore, BrewError> {
        self.apply_tank_transition_at(update, Self::now())
    }

    pub fn apply_tank_transition_at(
        &self,
        update: &TankUpdate,
        now: NaiveDateTime,
    ) -> Result<TankStore, BrewError> {
        let tanks = self.stores.load_tanks()?;
        let next = apply_transition(&tanks, update, now).map_err(|e| {
            warn!(tank = %update.name, error = %e, "tank transition rejected");
            e
        })?;
        self.stores.save_tanks(&next)?;
        Ok(next)
    }

    pub fn adjust_bottle_count(
        &self,
        beer: Beer,
        adjustment: Adjustment,
    ) -> Result<BottledInventory, BrewError> {
        let inventory = self.stores.load_inventory()?;
        let next = adjust_bottle_count(&inventory, beer, adjustment).map_err(|e| {
            warn!(beer = %beer, error = %e, "bottle adjustment rejected");
            e
        })?;
        self.stores.save_inventory(&next)?;
        Ok(next)
    }

    pub fn tank_status_report(&self) -> Result<TankStore, BrewError> {
        self.stores.load_tanks()
    }

    pub fn inventory_report(&self) -> Result<BottledInventory, BrewError> {
        self.stores.load_inventory()
    }

    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    /// Load what a plan needs: the ledger (if readable), tanks and bottles.
    fn planning_inputs(
        &self,
    ) -> Result<(Option<SalesLedger>, TankStore, BottledInventory), BrewError> {
        Ok((
            self.ledger_or_none(),
            self.stores.load_tanks()?,
            self.stores.load_inventory()?,
        ))
    }

    pub fn plan_at(&self, now: NaiveDateTime) -> Result<Plan, BrewError> {
        let (ledger, tanks, inventory) = self.planning_inputs()?;
        let view = BreweryView {
            ledger: ledger.as_ref(),
            tanks: &tanks,
            inventory: &inventory,
        };
        Ok(view.plan(now)?)
    }

    pub fn aggregate_beer_levels(&self) -> Result<Option<BeerLevels>, BrewError> {
        self.aggregate_beer_levels_at(Self::now())
    }

    pub fn aggregate_beer_levels_at(
        &self,
        now: NaiveDateTime,
    ) -> Result<Option<BeerLevels>, BrewError> {
        let (ledger, tanks, inventory) = self.planning_inputs()?;
        let view = BreweryView {
            ledger: ledger.as_ref(),
            tanks: &tanks,
            inventory: &inventory,
        };
        Ok(view.beer_levels(now)?)
    }

    pub fn recommend(&self) -> Result<Recommendations, BrewError> {
        self.recommend_at(Self::now())
    }

    pub fn recommend_at(&self, now: NaiveDateTime) -> Result<Recommendations, BrewError> {
        Ok(self.plan_at(now)?.recommendations)
    }

    // -----------------------------------------------------------------------
    // Baseline
    // -----------------------------------------------------------------------

    pub fn reset_to_baseline(&self) -> Result<ResetSource, BrewError> {
        baseline::restore(&self.stores, &self.baseline_dir, &self.fleet)
    }

    /// Save the current live stores as the baseline.
    pub fn capture_baseline(&self) -> Result<PathBuf, BrewError> {
        let stores = Stores {
            ledger: self.stores.load_ledger()?,
            tanks: self.stores.load_tanks()?,
            inventory: self.stores.load_inventory()?,
        };
        baseline::save_baseline(&self.baseline_dir, &stores)
    }

    /// Check that each live store loads and that a usable baseline exists.
    pub fn check(&self) -> CheckReport {
        let stores = StoreKind::ALL
            .into_iter()
            .map(|kind| {
                let loaded = match kind {
                    StoreKind::Sales => self.stores.load_ledger().map(drop),
                    StoreKind::Tanks => self.stores.load_tanks().map(drop),
                    StoreKind::Bottles => self.stores.load_inventory().map(drop),
                };
                (kind, loaded.map_err(|e| e.to_string()))
            })
            .collect();

        let baseline_path = baseline::baseline_path(&self.baseline_dir);
        let baseline = match baseline::load_baseline(&self.baseline_dir) {
            Ok(Some(b)) => b.verify(&baseline_path).map(drop).map_err(|e| e.to_string()),
            Ok(None) => Err(format!("no baseline at {}", baseline_path.display())),
            Err(e) => Err(e.to_string()),
        };

        let report = CheckReport { stores, baseline };
        if !report.is_healthy() {
            warn!("startup check found problems");
        }
        report
    }
}

/// Outcome of [`Brewhouse::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub stores: Vec<(StoreKind, Result<(), String>)>,
    pub baseline: Result<(), String>,
}

impl CheckReport {
    pub fn is_healthy(&self) -> bool {
        self.baseline.is_ok() && self.stores.iter().all(|(_, r)| r.is_ok())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, result) in &self.stores {
            match result {
                Ok(()) => writeln!(f, "ok       {} ({})", kind, kind.file_name())?,
                Err(e) => writeln!(f, "MISSING  {}: {}", kind, e)?,
            }
        }
        match &self.baseline {
            Ok(()) => writeln!(f, "ok       baseline"),
            Err(e) => writeln!(f, "MISSING  baseline: {}", e),
        }
    }
}
