//! Snapshot ingestion.
//!
//! The source is a CSV export whose first 13 columns are bound to logical
//! fields by *position*; header text is ignored. The contract matches
//! the upstream producer and is isolated here; the rest of the crate
//! only ever sees [`OfferRecord`] field names.
//!
//! Coercion is best-effort: a cell that fails to parse becomes `None` on
//! the record and the row is retained. Only structural problems (missing
//! source, too few columns, unreadable file) surface as [`LoadError`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::LoadError;
use crate::models::offer::OfferRecord;
use crate::models::routes::normalize_route;

/// Minimum column count the positional contract requires.
pub const EXPECTED_COLUMNS: usize = 13;

/// Positional indices of the logical fields.
mod col {
    pub const SEARCH_BATCH: usize = 0;
    pub const AIRLINE: usize = 1;
    pub const DEPARTURE_1: usize = 2;
    pub const DEPARTURE_2: usize = 3;
    pub const DEPARTURE_3: usize = 4;
    pub const FLIGHT_TYPE: usize = 5;
    pub const FLIGHT_DATE: usize = 6;
    pub const SEARCH_TIMESTAMP: usize = 7;
    pub const AGENCY: usize = 8;
    pub const PRICE: usize = 9;
    pub const ROUTE: usize = 10;
    pub const LEAD_TIME: usize = 11;
    pub const RANK: usize = 12;
}

/// The loaded, typed, read-only offer table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<OfferRecord>,
}

/// Footer-level stats about a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Most recent search timestamp in the snapshot.
    pub last_search: Option<NaiveDateTime>,
    /// Distinct scraping runs; falls back to distinct minute-floored
    /// timestamps when no batch ids are present.
    pub search_count: usize,
    pub offer_count: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> SnapshotSummary {
        let last_search = self.records.iter().filter_map(|r| r.search_timestamp).max();

        let batches: HashSet<&str> = self
            .records
            .iter()
            .filter_map(|r| r.search_batch.as_deref())
            .collect();
        let search_count = if batches.is_empty() {
            self.records
                .iter()
                .filter_map(|r| r.search_timestamp)
                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                .collect::<HashSet<_>>()
                .len()
        } else {
            batches.len()
        };

        SnapshotSummary {
            last_search,
            search_count,
            offer_count: self.records.len(),
        }
    }
}

/// Load a snapshot, validating the positional column contract.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, LoadError> {
    if !path.exists() {
        return Err(LoadError::SourceMissing(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader.headers().map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if headers.len() < EXPECTED_COLUMNS {
        return Err(LoadError::TooFewColumns {
            found: headers.len(),
            expected: EXPECTED_COLUMNS,
        });
    }

    let mut records = Vec::new();
    let mut coercion_failures = 0usize;
    for row in reader.records() {
        let row = row.map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (record, failures) = parse_row(&row);
        coercion_failures += failures;
        records.push(record);
    }

    if coercion_failures > 0 {
        warn!(
            cells = coercion_failures,
            "some cells failed type coercion and were loaded as null"
        );
    }
    info!(rows = records.len(), path = %path.display(), "snapshot loaded");

    Ok(Snapshot { records })
}

/// Memoized variant keyed by source path.
///
/// The cached table is read-only; every filter/aggregation pass derives
/// its result from it anew.
pub fn load_snapshot_cached(path: &Path) -> Result<Arc<Snapshot>, LoadError> {
    static CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Snapshot>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let mut cache = CACHE.lock();
    if let Some(snapshot) = cache.get(path) {
        return Ok(Arc::clone(snapshot));
    }
    let snapshot = Arc::new(load_snapshot(path)?);
    cache.insert(path.to_path_buf(), Arc::clone(&snapshot));
    Ok(snapshot)
}

/// Count a coercion failure when a non-empty cell produced no value.
fn noted<T>(parsed: Option<T>, raw: Option<&str>, failures: &mut usize) -> Option<T> {
    if parsed.is_none() && raw.is_some() {
        *failures += 1;
    }
    parsed
}

fn parse_row(row: &csv::StringRecord) -> (OfferRecord, usize) {
    let mut failures = 0usize;

    let text = |i: usize| {
        row.get(i)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let cell = |i: usize| row.get(i).map(str::trim).filter(|s| !s.is_empty());
    let datetime = |i: usize, failures: &mut usize| {
        noted(cell(i).and_then(parse_datetime), cell(i), failures)
    };

    let departure_time_1 = datetime(col::DEPARTURE_1, &mut failures);
    let departure_time_2 = datetime(col::DEPARTURE_2, &mut failures);
    let departure_time_3 = datetime(col::DEPARTURE_3, &mut failures);
    let flight_date = datetime(col::FLIGHT_DATE, &mut failures);
    let search_timestamp = datetime(col::SEARCH_TIMESTAMP, &mut failures);
    let price = noted(cell(col::PRICE).and_then(parse_f64), cell(col::PRICE), &mut failures);
    let lead_time_days = noted(
        cell(col::LEAD_TIME).and_then(parse_i64),
        cell(col::LEAD_TIME),
        &mut failures,
    );
    let rank = noted(cell(col::RANK).and_then(parse_i64), cell(col::RANK), &mut failures);

    let route_raw = text(col::ROUTE);
    let route_normalized = route_raw.as_deref().map(normalize_route);

    let record = OfferRecord {
        search_batch: text(col::SEARCH_BATCH),
        airline: text(col::AIRLINE),
        departure_time_1,
        departure_time_2,
        departure_time_3,
        flight_type: text(col::FLIGHT_TYPE),
        flight_date,
        search_timestamp,
        agency: text(col::AGENCY),
        price,
        route_raw,
        lead_time_days,
        rank,
        route_normalized,
    };
    (record, failures)
}

/// Day-first datetime coercion, tolerating date-only cells and ISO forms.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_f64(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_i64(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| parse_f64(s).map(|v| v as i64))
}
