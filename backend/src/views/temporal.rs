//! Temporal evolution: every per-period and per-hour table the time
//! analysis needs, computed over the principal-vs-competitor series set.
//!
//! The agency axis is the principals plus the three busiest competitors
//! in the working set. Every gap value is recomputed from its own
//! period (or period x dimension) slice.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{FilterParams, OfferRecord, RegionCatalog};
use crate::services::aggregate::{
    gap_vs_best, mean_price, mean_price_by_agency, principal_exclusions,
};
use crate::services::periods::{bucket_by_period, PeriodGranularity};

const TOP_COMPETITORS: usize = 3;
const TOP_REGIONS: usize = 5;
const PODIUM_RANKS: [i64; 3] = [1, 2, 3];

/// One value per period, aligned with [`TemporalReport::periods`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries {
    pub agency: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCounts {
    pub agency: String,
    pub total: Vec<u64>,
    pub rank1: Vec<u64>,
    pub rank2: Vec<u64>,
    pub rank3: Vec<u64>,
}

/// One value per period x ADVP cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvpGapSeries {
    pub principal: String,
    pub advp: i64,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGapSeries {
    pub principal: String,
    pub region: String,
    pub values: Vec<Option<f64>>,
}

/// One value per search hour, aligned with [`TemporalReport::hours`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub agency: String,
    pub values: Vec<Option<f64>>,
}

/// Share of one rank position held by one agency, per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRankShare {
    pub agency: String,
    pub rank: i64,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyCounts {
    pub agency: String,
    pub rank1: Vec<u64>,
    pub rank2: Vec<u64>,
    pub rank3: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalReport {
    pub granularity: PeriodGranularity,
    /// Period bucket labels, ascending.
    pub periods: Vec<NaiveDate>,
    /// Principals followed by the three busiest competitors.
    pub tracked_agencies: Vec<String>,
    pub mean_price_by_period: Vec<PeriodSeries>,
    pub offer_counts_by_period: Vec<PeriodCounts>,
    /// Each tracked agency's share of ranks 1 to 3, per period.
    pub rank_share_by_period: Vec<PeriodRankShare>,
    pub gap_by_period: Vec<PeriodSeries>,
    /// One series per principal per lead-time value present in the data.
    pub gap_by_period_advp: Vec<AdvpGapSeries>,
    pub gap_by_period_region: Vec<RegionGapSeries>,
    /// Distinct search hours present, ascending.
    pub hours: Vec<NaiveDateTime>,
    pub min_price_by_hour: Vec<HourlySeries>,
    pub rank_counts_by_hour: Vec<HourlyCounts>,
    /// Share of the agency's own offers that hour holding rank 1.
    pub rank1_share_of_agency_by_hour: Vec<HourlySeries>,
    /// The agency's share of all rank-1 offers that hour.
    pub rank1_share_of_hour: Vec<HourlySeries>,
}

pub fn compute(
    records: &[OfferRecord],
    params: &FilterParams,
    catalog: &RegionCatalog,
    granularity: PeriodGranularity,
) -> TemporalReport {
    let tracked_agencies = tracked_agencies(records, params);

    let buckets = bucket_by_period(records, params.start_date, params.end_date, granularity);
    let periods: Vec<NaiveDate> = buckets.keys().copied().collect();
    let period_slices: Vec<&Vec<&OfferRecord>> = buckets.values().collect();

    let mean_price_by_period = tracked_agencies
        .iter()
        .map(|agency| PeriodSeries {
            agency: agency.clone(),
            values: period_slices
                .iter()
                .map(|slice| {
                    mean_price(slice.iter().copied().filter(|r| r.is_agency(agency)))
                })
                .collect(),
        })
        .collect();

    let offer_counts_by_period = tracked_agencies
        .iter()
        .map(|agency| {
            let count = |pred: &dyn Fn(&OfferRecord) -> bool| -> Vec<u64> {
                period_slices
                    .iter()
                    .map(|slice| {
                        slice
                            .iter()
                            .filter(|r| r.is_agency(agency) && pred(r))
                            .count() as u64
                    })
                    .collect()
            };
            PeriodCounts {
                agency: agency.clone(),
                total: count(&|_| true),
                rank1: count(&|r| r.rank == Some(1)),
                rank2: count(&|r| r.rank == Some(2)),
                rank3: count(&|r| r.rank == Some(3)),
            }
        })
        .collect();

    let rank_share_by_period = PODIUM_RANKS
        .iter()
        .flat_map(|&rank| {
            tracked_agencies
                .iter()
                .map(|agency| PeriodRankShare {
                    agency: agency.clone(),
                    rank,
                    values: period_slices
                        .iter()
                        .map(|slice| {
                            let rank_total =
                                slice.iter().filter(|r| r.rank == Some(rank)).count();
                            if rank_total == 0 {
                                return None;
                            }
                            let own = slice
                                .iter()
                                .filter(|r| r.is_agency(agency) && r.rank == Some(rank))
                                .count();
                            Some(own as f64 / rank_total as f64 * 100.0)
                        })
                        .collect(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let gap_by_period = params
        .principals
        .iter()
        .map(|principal| PeriodSeries {
            agency: principal.clone(),
            values: period_slices
                .iter()
                .map(|slice| slice_gap(slice, principal))
                .collect(),
        })
        .collect();

    // Every lead-time value present, not just the canonical grid.
    let mut advps: Vec<i64> = records.iter().filter_map(|r| r.lead_time_days).collect();
    advps.sort_unstable();
    advps.dedup();

    let gap_by_period_advp = params
        .principals
        .iter()
        .flat_map(|principal| {
            advps
                .iter()
                .map(|&advp| AdvpGapSeries {
                    principal: principal.clone(),
                    advp,
                    values: period_slices
                        .iter()
                        .map(|slice| {
                            let cell: Vec<&OfferRecord> = slice
                                .iter()
                                .copied()
                                .filter(|r| r.lead_time_days == Some(advp))
                                .collect();
                            slice_gap(&cell, principal)
                        })
                        .collect(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let regions = top_regions(records, catalog);
    let gap_by_period_region = params
        .principals
        .iter()
        .flat_map(|principal| {
            regions
                .iter()
                .map(|region| RegionGapSeries {
                    principal: principal.clone(),
                    region: region.clone(),
                    values: period_slices
                        .iter()
                        .map(|slice| {
                            let routes = catalog.routes(region);
                            let cell: Vec<&OfferRecord> = slice
                                .iter()
                                .copied()
                                .filter(|r| {
                                    r.route_normalized.as_deref().is_some_and(|route| {
                                        routes.is_some_and(|set| set.contains(route))
                                    })
                                })
                                .collect();
                            slice_gap(&cell, principal)
                        })
                        .collect(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut hours: Vec<NaiveDateTime> = records.iter().filter_map(|r| r.search_hour()).collect();
    hours.sort_unstable();
    hours.dedup();

    let hour_slices: Vec<Vec<&OfferRecord>> = hours
        .iter()
        .map(|&h| {
            records
                .iter()
                .filter(|r| r.search_hour() == Some(h))
                .collect()
        })
        .collect();

    let min_price_by_hour = tracked_agencies
        .iter()
        .map(|agency| HourlySeries {
            agency: agency.clone(),
            values: hour_slices
                .iter()
                .map(|slice| {
                    slice
                        .iter()
                        .filter(|r| r.is_agency(agency))
                        .filter_map(|r| r.priced())
                        .fold(None, |acc, p| Some(acc.map_or(p, |m: f64| m.min(p))))
                })
                .collect(),
        })
        .collect();

    let rank_counts_by_hour = tracked_agencies
        .iter()
        .map(|agency| {
            let count = |rank: i64| -> Vec<u64> {
                hour_slices
                    .iter()
                    .map(|slice| {
                        slice
                            .iter()
                            .filter(|r| r.is_agency(agency) && r.rank == Some(rank))
                            .count() as u64
                    })
                    .collect()
            };
            HourlyCounts {
                agency: agency.clone(),
                rank1: count(1),
                rank2: count(2),
                rank3: count(3),
            }
        })
        .collect();

    let rank1_share_of_agency_by_hour = tracked_agencies
        .iter()
        .map(|agency| HourlySeries {
            agency: agency.clone(),
            values: hour_slices
                .iter()
                .map(|slice| {
                    let own_total = slice.iter().filter(|r| r.is_agency(agency)).count();
                    if own_total == 0 {
                        return None;
                    }
                    let own_rank1 = slice
                        .iter()
                        .filter(|r| r.is_agency(agency) && r.rank == Some(1))
                        .count();
                    Some(own_rank1 as f64 / own_total as f64 * 100.0)
                })
                .collect(),
        })
        .collect();

    let rank1_share_of_hour = tracked_agencies
        .iter()
        .map(|agency| HourlySeries {
            agency: agency.clone(),
            values: hour_slices
                .iter()
                .map(|slice| {
                    let rank1_total = slice.iter().filter(|r| r.rank == Some(1)).count();
                    if rank1_total == 0 {
                        return None;
                    }
                    let own = slice
                        .iter()
                        .filter(|r| r.is_agency(agency) && r.rank == Some(1))
                        .count();
                    Some(own as f64 / rank1_total as f64 * 100.0)
                })
                .collect(),
        })
        .collect();

    TemporalReport {
        granularity,
        periods,
        tracked_agencies,
        mean_price_by_period,
        offer_counts_by_period,
        rank_share_by_period,
        gap_by_period,
        gap_by_period_advp,
        gap_by_period_region,
        hours,
        min_price_by_hour,
        rank_counts_by_hour,
        rank1_share_of_agency_by_hour,
        rank1_share_of_hour,
    }
}

/// Principals first, then the three competitors with the most rows.
fn tracked_agencies(records: &[OfferRecord], params: &FilterParams) -> Vec<String> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if let Some(agency) = record.agency.as_deref() {
            if !params.principals.iter().any(|p| p == agency) {
                *counts.entry(agency).or_insert(0) += 1;
            }
        }
    }
    let mut competitors: Vec<(&str, u64)> = counts.into_iter().collect();
    competitors.sort_by(|(a_name, a_n), (b_name, b_n)| {
        b_n.cmp(a_n).then_with(|| a_name.cmp(b_name))
    });

    let mut tracked = params.principals.clone();
    tracked.extend(
        competitors
            .into_iter()
            .take(TOP_COMPETITORS)
            .map(|(name, _)| name.to_string()),
    );
    tracked
}

/// Regions ordered by row volume, busiest first, at most five.
fn top_regions(records: &[OfferRecord], catalog: &RegionCatalog) -> Vec<String> {
    let mut volumes: Vec<(String, usize)> = catalog
        .iter()
        .map(|(region, routes)| {
            let n = records
                .iter()
                .filter(|r| {
                    r.route_normalized
                        .as_deref()
                        .is_some_and(|route| routes.contains(route))
                })
                .count();
            (region.to_string(), n)
        })
        .filter(|(_, n)| *n > 0)
        .collect();
    volumes.sort_by(|(a_name, a_n), (b_name, b_n)| b_n.cmp(a_n).then_with(|| a_name.cmp(b_name)));
    volumes
        .into_iter()
        .take(TOP_REGIONS)
        .map(|(name, _)| name)
        .collect()
}

/// Both principals are excluded from the competitor pool regardless of
/// the caller's selection; the series set force-includes them.
fn slice_gap(slice: &[&OfferRecord], principal: &str) -> Option<f64> {
    let means = mean_price_by_agency(slice.iter().copied());
    gap_vs_best(principal, &means, &principal_exclusions())
}

#[cfg(test)]
#[path = "temporal_tests.rs"]
mod temporal_tests;
