//! The two-stage filter engine.
//!
//! Stage A restricts the snapshot to a region's route set. Stage B runs a
//! fixed pipeline over that slice: agency scope, the optional Grupo123
//! rewrite, lead time, agency membership, search-date window, route. The
//! step order matters because the rewrite changes the agency domain that
//! membership is evaluated against.
//!
//! Views that chart the principals over time use
//! [`apply_filters_for_timeseries`] instead, which skips scope and
//! grouping on the agency axis and force-includes both principal labels
//! so the lines never vanish because of a membership selection.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    AgencyScope, CompetitorSelection, FilterParams, GroupingMode, OfferRecord, RegionCatalog,
    DEFAULT_CARRIERS, GROUP_LABEL, PRINCIPAL_AGENCIES,
};

/// Output of one full filter pass.
///
/// `region_scoped` is the Stage A slice; route and agency pickers are
/// populated from it so choices outside the current filters stay visible.
/// `fully_filtered` is the Stage B working set every aggregation runs on.
#[derive(Debug, Clone)]
pub struct FilteredSet {
    pub region_scoped: Vec<OfferRecord>,
    pub fully_filtered: Vec<OfferRecord>,
}

/// Run both filter stages over a snapshot.
pub fn apply_filters(
    records: &[OfferRecord],
    params: &FilterParams,
    catalog: &RegionCatalog,
) -> FilteredSet {
    let region_scoped = region_slice(records, params, catalog);

    let scoped = scope_agency(&region_scoped, params.agency_scope);
    let mut working: Vec<OfferRecord> = scoped.into_iter().cloned().collect();
    if params.grouping == GroupingMode::Grouped {
        for record in &mut working {
            rewrite_group(record);
        }
    }

    let allowed = allowed_agencies(&working, params);
    let fully_filtered: Vec<OfferRecord> = working
        .into_iter()
        .filter(|r| params.lead_time.matches(r.lead_time_days))
        .filter(|r| r.agency.as_deref().is_some_and(|a| allowed.contains(a)))
        .filter(|r| in_date_window(r, params.start_date, params.end_date))
        .filter(|r| matches_route(r, params.route.as_deref()))
        .collect();

    debug!(
        scoped = region_scoped.len(),
        filtered = fully_filtered.len(),
        "filter pass complete"
    );
    FilteredSet {
        region_scoped,
        fully_filtered,
    }
}

/// Filter pass for principal-vs-competitor time series.
///
/// Applies region, agency scope, lead-time, date and route, then keeps
/// the selected agencies plus both principals unconditionally. No
/// grouping rewrite: the series compare the principals individually.
/// The scope step never removes a principal, so the force-include holds
/// under every scope.
pub fn apply_filters_for_timeseries(
    records: &[OfferRecord],
    params: &FilterParams,
    catalog: &RegionCatalog,
) -> Vec<OfferRecord> {
    let region_scoped = region_slice(records, params, catalog);
    let scoped = scope_agency(&region_scoped, params.agency_scope);

    let mut allowed: BTreeSet<String> = match &params.competitors {
        CompetitorSelection::AllRemaining => scoped
            .iter()
            .filter_map(|r| r.agency.clone())
            .collect(),
        CompetitorSelection::Listed(names) => names.iter().cloned().collect(),
    };
    allowed.extend(params.principals.iter().cloned());
    for principal in PRINCIPAL_AGENCIES {
        allowed.insert(principal.to_string());
    }

    scoped
        .into_iter()
        .filter(|r| params.lead_time.matches(r.lead_time_days))
        .filter(|r| r.agency.as_deref().is_some_and(|a| allowed.contains(a)))
        .filter(|r| in_date_window(r, params.start_date, params.end_date))
        .filter(|r| matches_route(r, params.route.as_deref()))
        .cloned()
        .collect()
}

/// Distinct raw route labels, sorted, for route pickers.
pub fn available_routes(records: &[OfferRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records.iter().filter_map(|r| r.route_raw.as_deref()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Widest lead-time interval present in the data.
pub fn lead_time_bounds(records: &[OfferRecord]) -> Option<(i64, i64)> {
    records
        .iter()
        .filter_map(|r| r.lead_time_days)
        .fold(None, |acc, l| match acc {
            None => Some((l, l)),
            Some((lo, hi)) => Some((lo.min(l), hi.max(l))),
        })
}

/// Widest search-date interval present in the data.
pub fn search_date_bounds(records: &[OfferRecord]) -> Option<(NaiveDate, NaiveDate)> {
    records
        .iter()
        .filter_map(|r| r.search_day())
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

fn region_slice(
    records: &[OfferRecord],
    params: &FilterParams,
    catalog: &RegionCatalog,
) -> Vec<OfferRecord> {
    match params.region.as_deref().and_then(|name| catalog.routes(name)) {
        Some(routes) => records
            .iter()
            .filter(|r| {
                r.route_normalized
                    .as_deref()
                    .is_some_and(|route| routes.contains(route))
            })
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}

fn scope_agency<'a>(records: &'a [OfferRecord], scope: AgencyScope) -> Vec<&'a OfferRecord> {
    match scope {
        AgencyScope::General => records.iter().collect(),
        // Rows without an agency are not carriers, so they stay.
        AgencyScope::AgenciesOnly => records
            .iter()
            .filter(|r| !r.agency.as_deref().is_some_and(is_carrier))
            .collect(),
        AgencyScope::AirlinesOnly => records
            .iter()
            .filter(|r| {
                r.agency
                    .as_deref()
                    .is_some_and(|a| is_carrier(a) || PRINCIPAL_AGENCIES.contains(&a))
            })
            .collect(),
    }
}

fn is_carrier(agency: &str) -> bool {
    DEFAULT_CARRIERS.contains(&agency)
}

/// Rewrite both principal labels to the group label in place.
fn rewrite_group(record: &mut OfferRecord) {
    if let Some(agency) = record.agency.as_deref() {
        if PRINCIPAL_AGENCIES.contains(&agency) {
            record.agency = Some(GROUP_LABEL.to_string());
        }
    }
}

/// Membership set for the working records, with the selection lists
/// mapped through the same grouping rewrite the records went through.
fn allowed_agencies(working: &[OfferRecord], params: &FilterParams) -> BTreeSet<String> {
    let map_label = |name: &str| -> String {
        if params.grouping == GroupingMode::Grouped && PRINCIPAL_AGENCIES.contains(&name) {
            GROUP_LABEL.to_string()
        } else {
            name.to_string()
        }
    };

    let mut allowed: BTreeSet<String> =
        params.principals.iter().map(|p| map_label(p)).collect();
    match &params.competitors {
        CompetitorSelection::AllRemaining => {
            allowed.extend(working.iter().filter_map(|r| r.agency.clone()));
        }
        CompetitorSelection::Listed(names) => {
            allowed.extend(names.iter().map(|n| map_label(n)));
        }
    }
    allowed
}

fn in_date_window(record: &OfferRecord, start: NaiveDate, end: NaiveDate) -> bool {
    record
        .search_day()
        .is_some_and(|day| start <= day && day <= end)
}

fn matches_route(record: &OfferRecord, route: Option<&str>) -> bool {
    match route {
        Some(r) => record.route_raw.as_deref() == Some(r),
        None => true,
    }
}

#[cfg(test)]
#[path = "filters_tests.rs"]
mod filters_tests;
