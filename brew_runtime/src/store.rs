//! Store Set: the three JSON blob stores under one data directory.
//!
//! - `encode_store`: store value → canonical JSON string
//! - `decode_*`:     JSON string → store value (tank stores are validated)
//! - `StoreSet`:     load/save by file, atomic replacement on save
//!
//! A store is replaced by writing a sibling `.tmp` file and renaming it
//! over the live file, so readers never see a half-written store.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use brew_engine::domain::TankStore;
use brew_engine::error::Rejection;
use brew_engine::inventory::BottledInventory;
use brew_engine::invariants::validate_tanks;
use brew_engine::ledger::SalesLedger;
use brew_engine::state::{create_initial_tanks, TankSpec};

use crate::error::{BrewError, StoreKind};

/// The three stores, loaded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stores {
    pub ledger: SalesLedger,
    pub tanks: TankStore,
    pub inventory: BottledInventory,
}

impl Stores {
    /// Fresh installation: empty ledger, every tank Idle, no bottles.
    pub fn defaults(fleet: &[TankSpec]) -> Result<Self, BrewError> {
        Ok(Self {
            ledger: SalesLedger::new(),
            tanks: create_initial_tanks(fleet)?,
            inventory: BottledInventory::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Compact JSON with no timestamps of its own; identical values encode
/// to identical bytes.
pub fn encode_store<T: Serialize>(kind: StoreKind, value: &T) -> Result<String, BrewError> {
    serde_json::to_string(value).map_err(|e| BrewError::StoreUnavailable {
        store: kind,
        path: PathBuf::from(kind.file_name()),
        reason: format!("encode failed: {}", e),
    })
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

pub fn decode_ledger(json: &str) -> Result<SalesLedger, String> {
    decode(json)
}

pub fn decode_inventory(json: &str) -> Result<BottledInventory, String> {
    decode(json)
}

/// Decode a tank store, put it in scan order and check its invariants.
pub fn decode_tanks(json: &str) -> Result<TankStore, String> {
    let mut store: TankStore = decode(json)?;
    store.tanks.sort_by_key(|t| t.name);
    validate_tanks(&store)?;
    Ok(store)
}

/// Replace `path` with `bytes` via a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

// ---------------------------------------------------------------------------
// Store set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoreSet {
    dir: PathBuf,
}

impl StoreSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: StoreKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn exists(&self, kind: StoreKind) -> bool {
        self.path(kind).is_file()
    }

    fn read(&self, kind: StoreKind) -> Result<String, BrewError> {
        let path = self.path(kind);
        fs::read_to_string(&path).map_err(|e| BrewError::StoreUnavailable {
            store: kind,
            path,
            reason: e.to_string(),
        })
    }

    fn load<T>(
        &self,
        kind: StoreKind,
        decode: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, BrewError> {
        let json = self.read(kind)?;
        decode(&json).map_err(|reason| BrewError::StoreUnavailable {
            store: kind,
            path: self.path(kind),
            reason,
        })
    }

    fn save<T: Serialize>(&self, kind: StoreKind, value: &T) -> Result<(), BrewError> {
        let json = encode_store(kind, value)?;
        let path = self.path(kind);
        write_atomic(&path, json.as_bytes()).map_err(|e| BrewError::io(&path, e))?;
        info!(store = %kind, path = %path.display(), "store written");
        Ok(())
    }

    pub fn load_ledger(&self) -> Result<SalesLedger, BrewError> {
        self.load(StoreKind::Sales, decode_ledger)
    }

    pub fn load_tanks(&self) -> Result<TankStore, BrewError> {
        self.load(StoreKind::Tanks, decode_tanks)
    }

    pub fn load_inventory(&self) -> Result<BottledInventory, BrewError> {
        self.load(StoreKind::Bottles, decode_inventory)
    }

    pub fn save_ledger(&self, ledger: &SalesLedger) -> Result<(), BrewError> {
        self.save(StoreKind::Sales, ledger)
    }

    /// Refuses to persist a store that breaks a tank invariant.
    pub fn save_tanks(&self, tanks: &TankStore) -> Result<(), BrewError> {
        validate_tanks(tanks).map_err(|msg| BrewError::Engine(Rejection::Invariant(msg).into()))?;
        self.save(StoreKind::Tanks, tanks)
    }

    pub fn save_inventory(&self, inventory: &BottledInventory) -> Result<(), BrewError> {
        self.save(StoreKind::Bottles, inventory)
    }

    pub fn save_all(&self, stores: &Stores) -> Result<(), BrewError> {
        self.save_ledger(&stores.ledger)?;
        self.save_tanks(&stores.tanks)?;
        self.save_inventory(&stores.inventory)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use brew_engine::domain::{Beer, TankId};
    use brew_engine::inventory::{adjust_bottle_count, Adjustment};
    use brew_engine::ledger::ingest;
    use brew_engine::state::default_fleet;

    fn stocked() -> Stores {
        let mut stores = Stores::defaults(&default_fleet()).unwrap();
        let rows = vec![vec!["INV-1", "", "05-Mar-19", "Organic Dunkel", "", "12"]];
        stores.ledger = ingest(&stores.ledger, &rows).unwrap().0;
        stores.inventory =
            adjust_bottle_count(&stores.inventory, Beer::Pilsner, Adjustment::Add(9)).unwrap();
        stores
    }

    // ── Test 1: Written stores read back equal ──────────────────────

    #[test]
    fn stores_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let set = StoreSet::new(dir.path());
        let stores = stocked();
        set.save_all(&stores).unwrap();

        assert_eq!(set.load_ledger().unwrap(), stores.ledger);
        assert_eq!(set.load_tanks().unwrap(), stores.tanks);
        assert_eq!(set.load_inventory().unwrap(), stores.inventory);
        assert!(!dir.path().join("tanks_status.json.tmp").exists());
    }

    // ── Test 2: Missing file → StoreUnavailable ─────────────────────

    #[test]
    fn missing_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let set = StoreSet::new(dir.path());
        match set.load_ledger().unwrap_err() {
            BrewError::StoreUnavailable { store, .. } => assert_eq!(store, StoreKind::Sales),
            other => panic!("Expected StoreUnavailable, got: {:?}", other),
        }
    }

    // ── Test 3: Tank store breaking an invariant is not loaded ──────

    #[test]
    fn tank_store_with_conditioning_r_is_rejected() {
        let mut tanks = create_initial_tanks(&default_fleet()).unwrap();
        let mut value = serde_json::to_value(&tanks).unwrap();
        let r = value["tanks"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|t| t["name"] == "R")
            .unwrap();
        r["status"] = "Conditioning".into();
        let err = decode_tanks(&value.to_string()).unwrap_err();
        assert!(err.contains("ferment_only"), "got: {}", err);

        tanks.tanks.reverse();
        let reordered = decode_tanks(&serde_json::to_string(&tanks).unwrap()).unwrap();
        assert_eq!(reordered.tanks[0].name, TankId::A);
    }

    // ── Test 4: Hand-written blobs in the documented layout ─────────

    #[test]
    fn reads_documented_layouts() {
        let inv = decode_inventory(
            r#"{"Organic Pilsner": "10", "Organic Red Helles": "0", "Organic Dunkel": "3"}"#,
        )
        .unwrap();
        assert_eq!(inv.bottles(Beer::Dunkel), 3);

        let ledger =
            decode_ledger(r#"{"week10": [{"year": "2019", "Organic Pilsner": "4"}]}"#).unwrap();
        let record = ledger.record(10, 2019).unwrap();
        assert_eq!(*record.counts.get(Beer::Pilsner), 4);
        assert_eq!(*record.counts.get(Beer::Dunkel), 0);
    }

    // ── Test 5: Identical stores encode identically ─────────────────

    #[test]
    fn encoding_is_deterministic() {
        let stores = stocked();
        let a = encode_store(StoreKind::Sales, &stores.ledger).unwrap();
        let b = encode_store(StoreKind::Sales, &stores.ledger.clone()).unwrap();
        assert_eq!(a, b);
    }

    // ── Test 6: Start date written only on tank R ───────────────────

    #[test]
    fn tank_store_with_date_only_on_r_decodes() {
        let tanks: Vec<serde_json::Value> = default_fleet()
            .iter()
            .map(|spec| {
                let mut tank = serde_json::json!({
                    "name": spec.name.as_str(),
                    "status": "Idle",
                    "beer_name": "N/A",
                    "current_volume": "0",
                    "capacity": spec.capacity.to_string(),
                });
                if spec.name == TankId::R {
                    tank["date"] = "N/A".into();
                }
                tank
            })
            .collect();
        let json = serde_json::json!({ "tanks": tanks }).to_string();

        let store = decode_tanks(&json).unwrap();
        assert_eq!(store, create_initial_tanks(&default_fleet()).unwrap());
        assert!(store.tanks.iter().all(|t| t.fermentation_start.is_none()));
    }
}
