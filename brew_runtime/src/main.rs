//! brewhouse: command-line front end for the brewhouse planner.
//!
//! Rendered output goes to stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use brew_engine::domain::{Beer, TankId, TankStatus};
use brew_engine::inventory::Adjustment;
use brew_engine::transitions::TankUpdate;
use brew_runtime::baseline::ResetSource;
use brew_runtime::brewhouse::Brewhouse;
use brew_runtime::config::{RuntimeConfig, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "brewhouse")]
#[command(about = "Tank tracking, demand forecasting and brewing recommendations")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Data directory (overrides config file)
    #[arg(short, long, env = "BREWHOUSE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show tank status and bottled stock
    Status,
    /// Append a sales CSV to the sales history
    Ingest {
        csv: PathBuf,
        /// Validate and summarise without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Set a tank's status, beer and volume
    Tank {
        name: TankId,
        status: TankStatus,
        #[arg(long)]
        beer: Option<Beer>,
        /// Litres in the tank after the change
        #[arg(long, default_value_t = 0)]
        volume: u32,
    },
    /// Add or remove bottled stock
    Bottles {
        #[command(subcommand)]
        action: BottlesAction,
    },
    /// Print the weekly demand forecast
    Forecast {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=52))]
        week: Option<u8>,
    },
    /// Print stock, in-process volume and 8-week need per beer
    Levels,
    /// Print what each finished or idle tank should do next
    Recommend,
    /// Replace all live stores with the baseline
    Reset {
        /// Confirm replacing the live stores
        #[arg(long)]
        yes: bool,
    },
    /// Save the live stores as the new baseline
    CaptureBaseline,
    /// Verify stores and baseline are present and readable
    Check,
}

#[derive(Subcommand)]
enum BottlesAction {
    Add { beer: Beer, count: u64 },
    Remove { beer: Beer, count: u64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("brewhouse=info,brew_runtime=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = RuntimeConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    info!(data_dir = %config.data_dir.display(), "brewhouse starting");

    let brewhouse = Brewhouse::new(&config);
    run(&brewhouse, cli.command)
}

fn run(brewhouse: &Brewhouse, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            print!("{}", brewhouse.tank_status_report()?);
            println!();
            println!("BOTTLED STOCK:");
            print!("{}", brewhouse.inventory_report()?);
        }
        Command::Ingest { csv, dry_run } => {
            let summary = brewhouse
                .ingest_sales(&csv, !dry_run)
                .with_context(|| format!("ingesting {}", csv.display()))?;
            println!("{}", summary);
            if dry_run {
                println!("(dry run, sales history not modified)");
            }
        }
        Command::Tank {
            name,
            status,
            beer,
            volume,
        } => {
            let tanks = brewhouse.apply_tank_transition(&TankUpdate {
                name,
                status,
                beer,
                volume,
            })?;
            if let Some(tank) = tanks.get(name) {
                println!("{}", tank);
            }
        }
        Command::Bottles { action } => {
            let (beer, adjustment) = match action {
                BottlesAction::Add { beer, count } => (beer, Adjustment::Add(count)),
                BottlesAction::Remove { beer, count } => (beer, Adjustment::Remove(count)),
            };
            let inventory = brewhouse.adjust_bottle_count(beer, adjustment)?;
            println!("{} : {}", beer, inventory.bottles(beer));
        }
        Command::Forecast { week } => match (brewhouse.compute_forecast()?, week) {
            (None, _) => println!("No sales history recorded."),
            (Some(forecast), None) => print!("{}", forecast),
            (Some(forecast), Some(week)) => {
                println!("Week {}:", week);
                for (beer, demand) in forecast.week(week).iter() {
                    println!("{} : {}", beer, demand);
                }
            }
        },
        Command::Levels => match brewhouse.aggregate_beer_levels()? {
            Some(levels) => print!("{}", levels),
            None => println!("No sales history recorded."),
        },
        Command::Recommend => print!("{}", brewhouse.recommend()?),
        Command::Reset { yes } => {
            if !yes {
                bail!("reset replaces every live store; pass --yes to confirm");
            }
            match brewhouse.reset_to_baseline()? {
                ResetSource::Baseline => println!("Stores restored from baseline."),
                ResetSource::Defaults => println!("No baseline found; stores reset to defaults."),
            }
        }
        Command::CaptureBaseline => {
            let path = brewhouse.capture_baseline()?;
            println!("Baseline written to {}", path.display());
        }
        Command::Check => {
            let report = brewhouse.check();
            print!("{}", report);
            if !report.is_healthy() {
                bail!("startup check failed; run `brewhouse reset --yes` to recreate missing stores");
            }
        }
    }
    Ok(())
}
