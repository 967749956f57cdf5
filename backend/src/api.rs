//! Stable data surface for presentation frontends.
//!
//! Everything a renderer needs is re-exported here: the filter
//! parameter types it builds requests from, and the report types each
//! view produces. All of them serialize with serde, so any transport or
//! embedding can carry them as JSON without touching the internals.

pub use crate::loader::{Snapshot, SnapshotSummary};
pub use crate::models::{
    AgencyScope, CompetitorSelection, FilterParams, GroupingMode, LeadTimeFilter, OfferRecord,
    RegionCatalog, ADVP_ORDER, DEFAULT_CARRIERS, GROUP_LABEL, PRINCIPAL_AGENCIES,
};
pub use crate::services::filters::FilteredSet;
pub use crate::services::periods::PeriodGranularity;
pub use crate::views::day_periods::DayPeriodsReport;
pub use crate::views::overview::OverviewReport;
pub use crate::views::rankings::RankingsReport;
pub use crate::views::temporal::TemporalReport;
pub use crate::views::top_routes::TopRoutesReport;
pub use crate::views::waterfalls::WaterfallsReport;

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
