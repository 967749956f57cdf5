//! Filter parameters shared by every analytical view, plus the fixed
//! business constants they reference.
//!
//! A [`FilterParams`] is constructed fresh for each render pass and is
//! immutable for the duration of one filter/aggregation cycle. The
//! constants below are injected configuration, not tunables: the carrier
//! list decides what "airlines-only" means, and the two principal labels
//! drive every competitive-gap computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::offer::OfferRecord;

/// The two tracked principal agencies.
pub const PRINCIPAL_AGENCIES: [&str; 2] = ["123MILHAS", "MAXMILHAS"];

/// Synthetic label replacing both principals in grouped mode.
pub const GROUP_LABEL: &str = "Grupo123";

/// Carriers that sell directly; the "airlines" side of the agency scope.
pub const DEFAULT_CARRIERS: [&str; 5] = ["GOL", "LATAM", "AZUL", "JETSMART", "TAP"];

/// Canonical ADVP (lead-time) display order.
pub const ADVP_ORDER: [i64; 8] = [1, 3, 7, 14, 21, 30, 60, 90];

/// Which seller kinds a view looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgencyScope {
    /// Everything.
    General,
    /// Drop the fixed carrier list.
    AgenciesOnly,
    /// Keep only the fixed carriers plus the principals.
    AirlinesOnly,
}

/// Whether the two principals are analyzed separately or as one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupingMode {
    Separate,
    /// Rewrite both principal labels to [`GROUP_LABEL`].
    Grouped,
}

/// Lead-time (ADVP) selection: one fixed value or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadTimeFilter {
    Fixed(i64),
    Range(i64, i64),
}

impl LeadTimeFilter {
    pub fn matches(&self, lead_time: Option<i64>) -> bool {
        match (self, lead_time) {
            (LeadTimeFilter::Fixed(v), Some(l)) => l == *v,
            (LeadTimeFilter::Range(a, b), Some(l)) => *a <= l && l <= *b,
            // Rows without a lead time never match a lead-time selection.
            (_, None) => false,
        }
    }
}

/// Competitor agencies to compare against the principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitorSelection {
    /// Every agency in the working set that is not a principal.
    AllRemaining,
    Listed(Vec<String>),
}

/// One view invocation's worth of filter state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterParams {
    /// Region name from the catalog, or `None` for all routes.
    pub region: Option<String>,
    pub agency_scope: AgencyScope,
    pub grouping: GroupingMode,
    /// Agencies under analysis, normally the two principals.
    pub principals: Vec<String>,
    pub competitors: CompetitorSelection,
    /// Exact raw route label, or `None` for all routes.
    pub route: Option<String>,
    pub lead_time: LeadTimeFilter,
    /// Inclusive calendar-date window on the search timestamp.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FilterParams {
    /// Defaults covering the full span of a snapshot: all regions, all
    /// agencies, principals vs everyone, widest lead-time and date range
    /// present in the data.
    pub fn full_span(records: &[OfferRecord]) -> Self {
        let (lead_min, lead_max) = records
            .iter()
            .filter_map(|r| r.lead_time_days)
            .fold(None::<(i64, i64)>, |acc, l| match acc {
                None => Some((l, l)),
                Some((lo, hi)) => Some((lo.min(l), hi.max(l))),
            })
            .unwrap_or((0, 1));

        let (start, end) = records
            .iter()
            .filter_map(|r| r.search_day())
            .fold(None::<(NaiveDate, NaiveDate)>, |acc, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
            .unwrap_or_else(|| {
                let today = chrono::Local::now().date_naive();
                (today, today)
            });

        let present: Vec<String> = PRINCIPAL_AGENCIES
            .iter()
            .filter(|p| records.iter().any(|r| r.is_agency(p)))
            .map(|p| p.to_string())
            .collect();
        let principals = if present.is_empty() {
            PRINCIPAL_AGENCIES.iter().map(|p| p.to_string()).collect()
        } else {
            present
        };

        FilterParams {
            region: None,
            agency_scope: AgencyScope::General,
            grouping: GroupingMode::Separate,
            principals,
            competitors: CompetitorSelection::AllRemaining,
            route: None,
            lead_time: LeadTimeFilter::Range(lead_min, lead_max),
            start_date: start,
            end_date: end,
        }
    }
}
