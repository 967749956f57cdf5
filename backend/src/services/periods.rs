//! Range-anchored period bucketing.
//!
//! Buckets are anchored at the filter window's start date, not at
//! calendar weeks or months: the first bucket always begins on
//! `start_date`, and each bucket is labeled by its own last day, clamped
//! to the window end so the final label never points past the data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::OfferRecord;

/// Bucket width for period aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodGranularity {
    Weekly,
    Biweekly,
    Monthly,
}

impl PeriodGranularity {
    /// Fixed bucket width in days.
    pub fn step_days(self) -> i64 {
        match self {
            PeriodGranularity::Weekly => 7,
            PeriodGranularity::Biweekly => 15,
            PeriodGranularity::Monthly => 30,
        }
    }
}

/// Bucket label for a `day` inside the `[start, end]` window.
pub fn assign_period(
    day: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    granularity: PeriodGranularity,
) -> NaiveDate {
    let step = granularity.step_days();
    let offset = (day - start).num_days().max(0);
    let index = offset / step;
    let label = start + chrono::Duration::days(index * step + step - 1);
    label.min(end)
}

/// Group records into period buckets keyed by their label date.
///
/// Records without a search timestamp, or whose day falls outside the
/// `[start, end]` window, are dropped.
pub fn bucket_by_period<'a>(
    records: &'a [OfferRecord],
    start: NaiveDate,
    end: NaiveDate,
    granularity: PeriodGranularity,
) -> BTreeMap<NaiveDate, Vec<&'a OfferRecord>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&OfferRecord>> = BTreeMap::new();
    for record in records {
        if let Some(day) = record.search_day() {
            if day < start || day > end {
                continue;
            }
            let label = assign_period(day, start, end, granularity);
            buckets.entry(label).or_default().push(record);
        }
    }
    buckets
}
