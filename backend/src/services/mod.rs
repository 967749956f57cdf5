//! Shared computation services: the two-stage filter engine, period
//! bucketing, and the price aggregation / competitive-gap primitives the
//! view modules are built from.

pub mod aggregate;
pub mod filters;
pub mod periods;

pub use aggregate::{
    best_competitor_mean, gap_vs_best, mean_price, mean_price_by_agency, rank_counts,
};
pub use filters::{apply_filters, apply_filters_for_timeseries, FilteredSet};
pub use periods::{bucket_by_period, PeriodGranularity};
