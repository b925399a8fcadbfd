//! Baseline: known-good copy of the three stores for resets.
//!
//! `baseline.json` holds each store's canonical JSON next to its SHA-256.
//! A restore verifies every entry before any live store is replaced; a
//! single mismatch restores nothing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use brew_engine::state::TankSpec;
use brew_engine::FORMAT_VERSION;

use crate::error::{BrewError, StoreKind};
use crate::store::{
    decode_inventory, decode_ledger, decode_tanks, encode_store, write_atomic, StoreSet, Stores,
};

pub const BASELINE_FILE: &str = "baseline.json";

/// One store as captured: canonical JSON and its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineEntry {
    pub canonical_json: String,
    /// SHA-256 of `canonical_json`, lowercase hex.
    pub hash: String,
}

impl BaselineEntry {
    fn capture(canonical_json: String) -> Self {
        let hash = store_hash(&canonical_json);
        Self {
            canonical_json,
            hash,
        }
    }

    /// Whether the hash still matches the content.
    pub fn verify(&self) -> bool {
        store_hash(&self.canonical_json) == self.hash
    }
}

/// On-disk baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Baseline {
    pub format_version: u32,
    pub sales: BaselineEntry,
    pub tanks: BaselineEntry,
    pub bottles: BaselineEntry,
}

/// Where a reset took its stores from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetSource {
    Baseline,
    /// No baseline on disk; built-in defaults were written.
    Defaults,
}

/// SHA-256 of a store's canonical JSON. Lowercase hex string.
pub fn store_hash(json: &str) -> String {
    let digest = Sha256::digest(json.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn baseline_path(dir: &Path) -> PathBuf {
    dir.join(BASELINE_FILE)
}

impl Baseline {
    pub fn capture(stores: &Stores) -> Result<Self, BrewError> {
        Ok(Self {
            format_version: FORMAT_VERSION,
            sales: BaselineEntry::capture(encode_store(StoreKind::Sales, &stores.ledger)?),
            tanks: BaselineEntry::capture(encode_store(StoreKind::Tanks, &stores.tanks)?),
            bottles: BaselineEntry::capture(encode_store(StoreKind::Bottles, &stores.inventory)?),
        })
    }

    fn entry(&self, kind: StoreKind) -> &BaselineEntry {
        match kind {
            StoreKind::Sales => &self.sales,
            StoreKind::Tanks => &self.tanks,
            StoreKind::Bottles => &self.bottles,
        }
    }

    /// Check every hash, then decode every store.
    ///
    /// `path` only labels the error.
    pub fn verify(&self, path: &Path) -> Result<Stores, BrewError> {
        let corrupt = |reason: String| BrewError::CorruptBaseline {
            path: path.to_path_buf(),
            reason,
        };

        if self.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        for kind in StoreKind::ALL {
            if !self.entry(kind).verify() {
                return Err(corrupt(format!("{} store hash mismatch", kind)));
            }
        }

        let ledger = decode_ledger(&self.sales.canonical_json)
            .map_err(|e| corrupt(format!("sales store: {}", e)))?;
        let tanks = decode_tanks(&self.tanks.canonical_json)
            .map_err(|e| corrupt(format!("tank store: {}", e)))?;
        let inventory = decode_inventory(&self.bottles.canonical_json)
            .map_err(|e| corrupt(format!("bottle store: {}", e)))?;

        Ok(Stores {
            ledger,
            tanks,
            inventory,
        })
    }
}

/// Write `stores` as the baseline in `dir`.
pub fn save_baseline(dir: &Path, stores: &Stores) -> Result<PathBuf, BrewError> {
    let baseline = Baseline::capture(stores)?;
    let path = baseline_path(dir);
    let content = serde_json::to_string_pretty(&baseline).map_err(|e| BrewError::CorruptBaseline {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    write_atomic(&path, content.as_bytes()).map_err(|e| BrewError::io(&path, e))?;
    info!(path = %path.display(), "baseline captured");
    Ok(path)
}

/// Load the baseline in `dir`. Returns None if there is none.
pub fn load_baseline(dir: &Path) -> Result<Option<Baseline>, BrewError> {
    let path = baseline_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).map_err(|e| BrewError::io(&path, e))?;
    let baseline = serde_json::from_str(&content).map_err(|e| BrewError::CorruptBaseline {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    Ok(Some(baseline))
}

/// Replace the live stores with the baseline, or with defaults when
/// `baseline_dir` holds no baseline.
pub fn restore(
    stores: &StoreSet,
    baseline_dir: &Path,
    fleet: &[TankSpec],
) -> Result<ResetSource, BrewError> {
    let (restored, source) = match load_baseline(baseline_dir)? {
        Some(baseline) => (baseline.verify(&baseline_path(baseline_dir))?, ResetSource::Baseline),
        None => {
            warn!(dir = %baseline_dir.display(), "no baseline found, resetting to defaults");
            (Stores::defaults(fleet)?, ResetSource::Defaults)
        }
    };
    stores.save_all(&restored)?;
    info!(source = ?source, dir = %stores.dir().display(), "stores reset");
    Ok(source)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
