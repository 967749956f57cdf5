//! Winning routes: where a principal holds rank 1 ahead of a distinct
//! runner-up, ranked by how far ahead it is.
//!
//! Offers are paired within a search context (batch, timestamp, route):
//! the rank-1, rank-2 and rank-3 rows of one context form one
//! observation. A context counts as a win for a principal when the
//! principal holds rank 1 and the rank-2 seller is someone else.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::OfferRecord;

const TOP_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEdge {
    pub route: String,
    /// Contexts where the principal won rank 1 against a distinct
    /// runner-up.
    pub wins: u64,
    pub min_price_rank1: Option<f64>,
    pub min_price_rank2: Option<f64>,
    pub min_price_rank3: Option<f64>,
    /// Mean of `(p2 - p1) / p1 * 100` over the winning contexts.
    pub mean_gap_to_second_pct: Option<f64>,
    pub mean_gap_to_third_pct: Option<f64>,
    /// Most frequent runner-up and third-place agencies.
    pub top_second_agency: Option<String>,
    pub top_third_agency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalRoutes {
    pub principal: String,
    /// At most 20 routes, widest mean gap-to-second first.
    pub routes: Vec<RouteEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRoutesReport {
    pub tables: Vec<PrincipalRoutes>,
}

/// One search context's podium.
#[derive(Default)]
struct Podium<'a> {
    first: Option<&'a OfferRecord>,
    second: Option<&'a OfferRecord>,
    third: Option<&'a OfferRecord>,
}

#[derive(Default)]
struct RouteStats {
    wins: u64,
    min_p1: Option<f64>,
    min_p2: Option<f64>,
    min_p3: Option<f64>,
    gap2: Vec<f64>,
    gap3: Vec<f64>,
    second_agencies: BTreeMap<String, u64>,
    third_agencies: BTreeMap<String, u64>,
}

pub fn compute(records: &[OfferRecord], principals: &[String]) -> TopRoutesReport {
    let podiums = build_podiums(records);

    let tables = principals
        .iter()
        .map(|principal| {
            let mut per_route: BTreeMap<&str, RouteStats> = BTreeMap::new();
            for (&(_, _, route), podium) in &podiums {
                let Some(first) = podium.first else { continue };
                if first.agency.as_deref() != Some(principal.as_str()) {
                    continue;
                }
                let Some(second) = podium.second else { continue };
                if second.agency.as_deref() == Some(principal.as_str()) {
                    continue;
                }
                let stats = per_route.entry(route).or_default();
                stats.wins += 1;
                accumulate(stats, first, second, podium.third);
            }

            let mut routes: Vec<RouteEdge> = per_route
                .into_iter()
                .map(|(route, stats)| finish_route(route, stats))
                .collect();
            routes.sort_by(|a, b| {
                let key = |e: &RouteEdge| e.mean_gap_to_second_pct.unwrap_or(f64::NEG_INFINITY);
                key(b)
                    .partial_cmp(&key(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.route.cmp(&b.route))
            });
            routes.truncate(TOP_LIMIT);

            PrincipalRoutes {
                principal: principal.clone(),
                routes,
            }
        })
        .collect();

    TopRoutesReport { tables }
}

type ContextKey<'a> = (Option<&'a str>, Option<NaiveDateTime>, &'a str);

fn build_podiums<'a>(records: &'a [OfferRecord]) -> HashMap<ContextKey<'a>, Podium<'a>> {
    let mut podiums: HashMap<ContextKey, Podium> = HashMap::new();
    for record in records {
        let Some(route) = record.route_raw.as_deref() else {
            continue;
        };
        let key = (
            record.search_batch.as_deref(),
            record.search_timestamp,
            route,
        );
        let podium = podiums.entry(key).or_default();
        // First occurrence per position wins within one context.
        match record.rank {
            Some(1) if podium.first.is_none() => podium.first = Some(record),
            Some(2) if podium.second.is_none() => podium.second = Some(record),
            Some(3) if podium.third.is_none() => podium.third = Some(record),
            _ => {}
        }
    }
    podiums
}

fn accumulate(
    stats: &mut RouteStats,
    first: &OfferRecord,
    second: &OfferRecord,
    third: Option<&OfferRecord>,
) {
    let p1 = first.priced();
    let p2 = second.priced();
    let p3 = third.and_then(|r| r.priced());

    stats.min_p1 = min_opt(stats.min_p1, p1);
    stats.min_p2 = min_opt(stats.min_p2, p2);
    stats.min_p3 = min_opt(stats.min_p3, p3);

    if let (Some(p1), Some(p2)) = (p1, p2) {
        if p1 > 0.0 {
            stats.gap2.push((p2 - p1) / p1 * 100.0);
        }
    }
    if let (Some(p1), Some(p3)) = (p1, p3) {
        if p1 > 0.0 {
            stats.gap3.push((p3 - p1) / p1 * 100.0);
        }
    }

    if let Some(agency) = second.agency.as_deref() {
        *stats.second_agencies.entry(agency.to_string()).or_insert(0) += 1;
    }
    if let Some(agency) = third.and_then(|r| r.agency.as_deref()) {
        *stats.third_agencies.entry(agency.to_string()).or_insert(0) += 1;
    }
}

fn finish_route(route: &str, stats: RouteStats) -> RouteEdge {
    RouteEdge {
        route: route.to_string(),
        wins: stats.wins,
        min_price_rank1: stats.min_p1,
        min_price_rank2: stats.min_p2,
        min_price_rank3: stats.min_p3,
        mean_gap_to_second_pct: mean(&stats.gap2),
        mean_gap_to_third_pct: mean(&stats.gap3),
        top_second_agency: mode(&stats.second_agencies),
        top_third_agency: mode(&stats.third_agencies),
    }
}

fn min_opt(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a.min(v)),
        (None, v) => v,
        (a, None) => a,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent key; ties resolve to the alphabetically first.
fn mode(counts: &BTreeMap<String, u64>) -> Option<String> {
    counts
        .iter()
        .max_by(|(a_name, a_n), (b_name, b_n)| a_n.cmp(b_n).then_with(|| b_name.cmp(a_name)))
        .map(|(name, _)| name.clone())
}
