/// Sales Ledger and Ingestion
///
/// Per-week history of sales, one record per calendar year. Ingestion
/// folds CSV rows into a copy of the ledger; the caller's ledger is never
/// modified, so a failed batch leaves nothing half-applied.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::calendar::{parse_order_date, week_of_year, WEEKS_PER_YEAR};
use crate::domain::{Beer, PerBeer};
use crate::error::EngineError;
use crate::serde_fields;

/// Column 0 of a header row.
pub const HEADER_MARKER: &str = "Invoice Number";

const COL_INVOICE: usize = 0;
const COL_ORDER_DATE: usize = 2;
const COL_BEER: usize = 3;
const COL_QUANTITY: usize = 5;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Sales for one week of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawYearRecord", into = "RawYearRecord")]
pub struct YearRecord {
    pub year: i32,
    pub counts: PerBeer<u64>,
}

impl YearRecord {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            counts: PerBeer::default(),
        }
    }
}

/// Persisted layout: `{"year": "2019", "Organic Pilsner": 12, ...}`.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawYearRecord {
    #[serde(with = "serde_fields::year_string")]
    year: i32,
    #[serde(rename = "Organic Pilsner", default, deserialize_with = "serde_fields::lenient_u64")]
    pilsner: u64,
    #[serde(rename = "Organic Red Helles", default, deserialize_with = "serde_fields::lenient_u64")]
    red_helles: u64,
    #[serde(rename = "Organic Dunkel", default, deserialize_with = "serde_fields::lenient_u64")]
    dunkel: u64,
}

impl From<RawYearRecord> for YearRecord {
    fn from(raw: RawYearRecord) -> Self {
        Self {
            year: raw.year,
            counts: PerBeer::from_fn(|beer| match beer {
                Beer::Pilsner => raw.pilsner,
                Beer::RedHelles => raw.red_helles,
                Beer::Dunkel => raw.dunkel,
            }),
        }
    }
}

impl From<YearRecord> for RawYearRecord {
    fn from(rec: YearRecord) -> Self {
        Self {
            year: rec.year,
            pilsner: *rec.counts.get(Beer::Pilsner),
            red_helles: *rec.counts.get(Beer::RedHelles),
            dunkel: *rec.counts.get(Beer::Dunkel),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Week index `1..=52` to yearly records, in insertion order.
///
/// Persisted as `{"week1": [...], ..., "week52": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<YearRecord>>")]
pub struct SalesLedger {
    weeks: Vec<Vec<YearRecord>>,
}

impl Default for SalesLedger {
    fn default() -> Self {
        Self {
            weeks: vec![Vec::new(); WEEKS_PER_YEAR as usize],
        }
    }
}

impl SalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records for `week` (1-based). Out-of-range weeks have none.
    pub fn week(&self, week: u8) -> &[YearRecord] {
        week_slot(week)
            .and_then(|i| self.weeks.get(i))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn record(&self, week: u8, year: i32) -> Option<&YearRecord> {
        self.week(week).iter().find(|r| r.year == year)
    }

    /// Total yearly records across all weeks.
    pub fn record_count(&self) -> usize {
        self.weeks.iter().map(Vec::len).sum()
    }

    /// No yearly records at all: nothing to forecast from.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Find or create the record for `(week, year)`.
    /// Returns whether it was created.
    fn record_mut(&mut self, week: u8, year: i32) -> (&mut YearRecord, bool) {
        let slot = week_slot(week).unwrap_or(WEEKS_PER_YEAR as usize - 1);
        let records = &mut self.weeks[slot];
        match records.iter().position(|r| r.year == year) {
            Some(i) => (&mut records[i], false),
            None => {
                records.push(YearRecord::empty(year));
                let last = records.len() - 1;
                (&mut records[last], true)
            }
        }
    }
}

fn week_slot(week: u8) -> Option<usize> {
    if (1..=WEEKS_PER_YEAR).contains(&week) {
        Some(week as usize - 1)
    } else {
        None
    }
}

fn week_key(week: u8) -> String {
    format!("week{}", week)
}

impl Serialize for SalesLedger {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.weeks.len()))?;
        for (i, records) in self.weeks.iter().enumerate() {
            map.serialize_entry(&week_key(i as u8 + 1), records)?;
        }
        map.end()
    }
}

impl TryFrom<BTreeMap<String, Vec<YearRecord>>> for SalesLedger {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Vec<YearRecord>>) -> Result<Self, Self::Error> {
        let mut ledger = SalesLedger::new();
        for (key, records) in raw {
            let slot = key
                .strip_prefix("week")
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(week_slot)
                .ok_or_else(|| format!("unexpected ledger key {:?}", key))?;
            for (i, rec) in records.iter().enumerate() {
                if records[..i].iter().any(|r| r.year == rec.year) {
                    return Err(format!("{} lists year {} twice", key, rec.year));
                }
            }
            ledger.weeks[slot] = records;
        }
        Ok(ledger)
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// One parsed sales row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRow {
    pub order_date: NaiveDate,
    pub beer: Beer,
    pub quantity: u64,
}

impl SaleRow {
    /// Parse the positional columns of a data row. `line` is 1-based.
    pub fn parse<S: AsRef<str>>(line: usize, fields: &[S]) -> Result<Self, EngineError> {
        let malformed = |reason: String| EngineError::MalformedInput {
            line,
            row: render_row(fields),
            reason,
        };

        if fields.len() <= COL_QUANTITY {
            return Err(malformed(format!(
                "expected at least {} columns, found {}",
                COL_QUANTITY + 1,
                fields.len()
            )));
        }

        let date_text = fields[COL_ORDER_DATE].as_ref();
        let order_date = parse_order_date(date_text)
            .map_err(|e| malformed(format!("invalid order date {:?}: {}", date_text, e)))?;

        let beer_text = fields[COL_BEER].as_ref();
        let beer = beer_text
            .trim()
            .parse::<Beer>()
            .map_err(|e| malformed(e.to_string()))?;

        let qty_text = fields[COL_QUANTITY].as_ref();
        let quantity = qty_text
            .trim()
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid quantity {:?}: {}", qty_text, e)))?;

        Ok(Self {
            order_date,
            beer,
            quantity,
        })
    }
}

/// Outcome counters for a successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub rows_ingested: usize,
    pub headers_skipped: usize,
    pub records_created: usize,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows ingested, {} new weekly records, {} header rows skipped",
            self.rows_ingested, self.records_created, self.headers_skipped
        )
    }
}

fn is_header<S: AsRef<str>>(fields: &[S]) -> bool {
    fields
        .get(COL_INVOICE)
        .map(|f| f.as_ref().trim() == HEADER_MARKER)
        .unwrap_or(false)
}

fn render_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<&str>>()
        .join(",")
}

/// Fold `rows` into a copy of `ledger`.
///
/// Any invalid row fails the whole batch with `MalformedInput`.
pub fn ingest<R, S>(
    ledger: &SalesLedger,
    rows: &[R],
) -> Result<(SalesLedger, IngestSummary), EngineError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut next = ledger.clone();
    let mut summary = IngestSummary::default();

    for (i, row) in rows.iter().enumerate() {
        let fields = row.as_ref();
        if is_header(fields) {
            summary.headers_skipped += 1;
            continue;
        }
        let sale = SaleRow::parse(i + 1, fields)?;
        let week = week_of_year(sale.order_date);
        let (record, created) = next.record_mut(week, sale.order_date.year());
        let count = record.counts.get_mut(sale.beer);
        *count = count.checked_add(sale.quantity).ok_or_else(|| {
            EngineError::Overflow(format!(
                "week {} of {}: {} count overflows",
                week,
                sale.order_date.year(),
                sale.beer
            ))
        })?;
        if created {
            summary.records_created += 1;
        }
        summary.rows_ingested += 1;
    }

    debug!(
        rows = summary.rows_ingested,
        created = summary.records_created,
        "sales rows ingested"
    );
    Ok((next, summary))
}
