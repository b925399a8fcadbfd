//! Runtime configuration (`brewhouse.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use brew_engine::state::{create_initial_tanks, default_fleet, TankSpec};

use crate::error::BrewError;

pub const DEFAULT_CONFIG_FILE: &str = "brewhouse.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory holding the three live stores
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding `baseline.json`; `<data_dir>/baseline` when unset
    #[serde(default)]
    pub baseline_dir: Option<PathBuf>,

    /// Tank capacities used when stores are created from scratch
    #[serde(default = "default_fleet")]
    pub fleet: Vec<TankSpec>,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            baseline_dir: None,
            fleet: default_fleet(),
        }
    }
}

impl RuntimeConfig {
    /// Load `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, BrewError> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| BrewError::io(path, e))?;
        Self::parse(&content).map_err(|reason| BrewError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse TOML and check the fleet describes a valid brewhouse.
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: RuntimeConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        create_initial_tanks(&config.fleet).map_err(|e| format!("fleet: {}", e))?;
        Ok(config)
    }

    pub fn baseline_dir(&self) -> PathBuf {
        self.baseline_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("baseline"))
    }
}
