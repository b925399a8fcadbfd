//! Integration tests for brew_runtime.
//!
//! Every test works in its own temporary data directory.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use brew_engine::domain::{Beer, TankId, TankStatus};
use brew_engine::error::{EngineError, Rejection};
use brew_engine::inventory::Adjustment;
use brew_engine::recommend::Recommendation;
use brew_engine::transitions::TankUpdate;
use brew_runtime::baseline::{self, ResetSource};
use brew_runtime::brewhouse::Brewhouse;
use brew_runtime::config::RuntimeConfig;
use brew_runtime::error::{BrewError, StoreKind};

const SALES_CSV: &str = "\
Invoice Number,Customer,Date Required,Recipe,Gyle Number,Quantity ordered
INV-1,Cafe,05-Mar-19,Organic Pilsner,G1,20
INV-2,Cafe,05-Mar-19,Organic Red Helles,G2,5
INV-3,Bar,06-Mar-19,Organic Dunkel,G3,5
";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 3, 5)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap()
}

/// A brewhouse over fresh default stores in a temp directory.
fn brewhouse(dir: &TempDir) -> Brewhouse {
    let config = RuntimeConfig {
        data_dir: dir.path().join("data"),
        ..RuntimeConfig::default()
    };
    let brewhouse = Brewhouse::new(&config);
    assert_eq!(brewhouse.reset_to_baseline().unwrap(), ResetSource::Defaults);
    brewhouse
}

fn write_csv(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn file_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

// ─────────────────────────────────────────────────────────────
// Test 1: ingest_persists_and_feeds_the_forecast
// ─────────────────────────────────────────────────────────────

#[test]
fn ingest_persists_and_feeds_the_forecast() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    assert!(house.compute_forecast().unwrap().is_none());

    let csv = write_csv(&dir, "sales.csv", SALES_CSV);
    let summary = house.ingest_sales(&csv, true).unwrap();
    assert_eq!(summary.rows_ingested, 3);
    assert_eq!(summary.headers_skipped, 1);
    assert_eq!(summary.records_created, 1);

    let forecast = house.compute_forecast().unwrap().unwrap();
    assert_eq!(*forecast.week(10).get(Beer::Pilsner), 20);
    assert_eq!(*forecast.week(10).get(Beer::Dunkel), 5);
}

// ─────────────────────────────────────────────────────────────
// Test 2: malformed_csv_leaves_ledger_file_unmodified
// ─────────────────────────────────────────────────────────────

#[test]
fn malformed_csv_leaves_ledger_file_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    let ledger_path = house.stores().path(StoreKind::Sales);
    let before = file_bytes(&ledger_path);

    let csv = write_csv(
        &dir,
        "bad.csv",
        "INV-1,Cafe,05-Mar-19,Organic Pilsner,G1,20\nINV-2,Cafe,31-Foo-19,Organic Dunkel,G2,5\n",
    );
    match house.ingest_sales(&csv, true).unwrap_err() {
        BrewError::Engine(EngineError::MalformedInput { line, row, .. }) => {
            assert_eq!(line, 2);
            assert!(row.contains("31-Foo-19"), "got: {}", row);
        }
        other => panic!("Expected MalformedInput, got: {:?}", other),
    }
    assert_eq!(file_bytes(&ledger_path), before);
}

// ─────────────────────────────────────────────────────────────
// Test 3: dry_run_does_not_write
// ─────────────────────────────────────────────────────────────

#[test]
fn dry_run_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    let ledger_path = house.stores().path(StoreKind::Sales);
    let before = file_bytes(&ledger_path);

    let csv = write_csv(&dir, "sales.csv", SALES_CSV);
    let summary = house.ingest_sales(&csv, false).unwrap();
    assert_eq!(summary.rows_ingested, 3);
    assert_eq!(file_bytes(&ledger_path), before);
}

// ─────────────────────────────────────────────────────────────
// Test 4: recommend_without_history_gives_only_the_message
// ─────────────────────────────────────────────────────────────

#[test]
fn recommend_without_history_gives_only_the_message() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    let recs = house.recommend_at(now()).unwrap();
    assert!(recs.is_no_history());

    // An unreadable sales store degrades the same way.
    fs::write(house.stores().path(StoreKind::Sales), "not json").unwrap();
    assert!(house.recommend_at(now()).unwrap().is_no_history());
    assert!(house.aggregate_beer_levels_at(now()).unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 5: full_cycle_recommends_pilsner
// ─────────────────────────────────────────────────────────────

#[test]
fn full_cycle_recommends_pilsner() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    let csv = write_csv(&dir, "sales.csv", SALES_CSV);
    house.ingest_sales(&csv, true).unwrap();
    for beer in Beer::ALL {
        house.adjust_bottle_count(beer, Adjustment::Add(10)).unwrap();
    }
    // Occupy everything except G.
    for id in TankId::ALL {
        let status = match id {
            TankId::G => continue,
            TankId::H => TankStatus::Conditioning,
            _ => TankStatus::Fermenting,
        };
        house
            .apply_tank_transition_at(
                &TankUpdate {
                    name: id,
                    status,
                    beer: None,
                    volume: 0,
                },
                now(),
            )
            .unwrap();
    }

    let levels = house.aggregate_beer_levels_at(now()).unwrap().unwrap();
    assert_eq!(levels.current_week, 10);

    let recs = house.recommend_at(now()).unwrap();
    assert_eq!(
        recs.0,
        vec![Recommendation::Fill {
            tank: TankId::G,
            beer: Beer::Pilsner
        }]
    );
}

// ─────────────────────────────────────────────────────────────
// Test 6: rejected_transition_leaves_tank_file_unmodified
// ─────────────────────────────────────────────────────────────

#[test]
fn rejected_transition_leaves_tank_file_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    let tanks_path = house.stores().path(StoreKind::Tanks);
    let before = file_bytes(&tanks_path);

    let err = house
        .apply_tank_transition_at(
            &TankUpdate {
                name: TankId::R,
                status: TankStatus::Conditioning,
                beer: Some(Beer::Dunkel),
                volume: 400,
            },
            now(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BrewError::Engine(EngineError::ValidationRejected(Rejection::FermentOnly))
    ));
    assert_eq!(file_bytes(&tanks_path), before);
}

// ─────────────────────────────────────────────────────────────
// Test 7: accepted_transition_is_persisted_with_start_date
// ─────────────────────────────────────────────────────────────

#[test]
fn accepted_transition_is_persisted_with_start_date() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    house
        .apply_tank_transition_at(
            &TankUpdate {
                name: TankId::R,
                status: TankStatus::Fermenting,
                beer: Some(Beer::Dunkel),
                volume: 900,
            },
            now(),
        )
        .unwrap();

    let r = house.tank_status_report().unwrap().get(TankId::R).cloned().unwrap();
    assert_eq!(r.status, TankStatus::Fermenting);
    assert_eq!(r.current_volume, 900);
    assert_eq!(r.fermentation_start, Some(now()));
}

// ─────────────────────────────────────────────────────────────
// Test 8: bottle_removal_below_zero_is_rejected
// ─────────────────────────────────────────────────────────────

#[test]
fn bottle_removal_below_zero_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    house.adjust_bottle_count(Beer::RedHelles, Adjustment::Add(3)).unwrap();

    let err = house
        .adjust_bottle_count(Beer::RedHelles, Adjustment::Remove(5))
        .unwrap_err();
    assert!(matches!(
        err,
        BrewError::Engine(EngineError::NegativeQuantity { .. })
    ));
    assert_eq!(house.inventory_report().unwrap().bottles(Beer::RedHelles), 3);
}

// ─────────────────────────────────────────────────────────────
// Test 9: reset_restores_captured_baseline
// ─────────────────────────────────────────────────────────────

#[test]
fn reset_restores_captured_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    house.adjust_bottle_count(Beer::Dunkel, Adjustment::Add(40)).unwrap();
    house.capture_baseline().unwrap();

    house.adjust_bottle_count(Beer::Dunkel, Adjustment::Remove(40)).unwrap();
    let csv = write_csv(&dir, "sales.csv", SALES_CSV);
    house.ingest_sales(&csv, true).unwrap();

    assert_eq!(house.reset_to_baseline().unwrap(), ResetSource::Baseline);
    assert_eq!(house.inventory_report().unwrap().bottles(Beer::Dunkel), 40);
    assert!(house.compute_forecast().unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 10: tampered_baseline_is_rejected_and_live_stores_unchanged
// ─────────────────────────────────────────────────────────────

#[test]
fn tampered_baseline_is_rejected_and_live_stores_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);
    house.capture_baseline().unwrap();

    let path = baseline::baseline_path(house.baseline_dir());
    let mut baseline = baseline::load_baseline(house.baseline_dir()).unwrap().unwrap();
    baseline.tanks.canonical_json = baseline.tanks.canonical_json.replace("1000", "9000");
    fs::write(&path, serde_json::to_string(&baseline).unwrap()).unwrap();

    house.adjust_bottle_count(Beer::Pilsner, Adjustment::Add(7)).unwrap();
    let live: Vec<Vec<u8>> = StoreKind::ALL
        .iter()
        .map(|k| file_bytes(&house.stores().path(*k)))
        .collect();

    match house.reset_to_baseline().unwrap_err() {
        BrewError::CorruptBaseline { reason, .. } => {
            assert!(reason.contains("tank"), "got: {}", reason)
        }
        other => panic!("Expected CorruptBaseline, got: {:?}", other),
    }
    let after: Vec<Vec<u8>> = StoreKind::ALL
        .iter()
        .map(|k| file_bytes(&house.stores().path(*k)))
        .collect();
    assert_eq!(live, after);
}

// ─────────────────────────────────────────────────────────────
// Test 11: check_reports_missing_pieces
// ─────────────────────────────────────────────────────────────

#[test]
fn check_reports_missing_pieces() {
    let dir = tempfile::tempdir().unwrap();
    let house = brewhouse(&dir);

    let report = house.check();
    assert!(report.stores.iter().all(|(_, r)| r.is_ok()));
    assert!(report.baseline.is_err(), "no baseline captured yet");
    assert!(!report.is_healthy());

    house.capture_baseline().unwrap();
    assert!(house.check().is_healthy());

    fs::remove_file(house.stores().path(StoreKind::Bottles)).unwrap();
    let report = house.check();
    assert!(!report.is_healthy());
    assert!(report.to_string().contains("MISSING  bottle"));
}

// ─────────────────────────────────────────────────────────────
// Test 12: missing_tank_store_is_unavailable
// ─────────────────────────────────────────────────────────────

#[test]
fn missing_tank_store_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = RuntimeConfig {
        data_dir: dir.path().join("empty"),
        ..RuntimeConfig::default()
    };
    let house = Brewhouse::new(&config);
    let err = house.recommend_at(now()).unwrap_err();
    assert!(err.is_store_unavailable(), "got: {:?}", err);
}
