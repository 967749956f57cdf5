//! Gap cascades: one bar per ADVP value and one per region, per
//! principal, each bar recomputed from its own slice of the working set.

use serde::{Deserialize, Serialize};

use crate::models::{FilterParams, OfferRecord, RegionCatalog, ADVP_ORDER};
use crate::services::aggregate::{gap_vs_best, mean_price_by_agency, principal_exclusions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub label: String,
    pub gap_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalCascade {
    pub principal: String,
    pub steps: Vec<CascadeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallsReport {
    /// ADVP cascade in canonical order, only values present in the data.
    pub by_advp: Vec<PrincipalCascade>,
    /// Region cascade in catalog order, only regions with rows.
    pub by_region: Vec<PrincipalCascade>,
}

pub fn compute(
    records: &[OfferRecord],
    params: &FilterParams,
    catalog: &RegionCatalog,
) -> WaterfallsReport {
    let by_advp = params
        .principals
        .iter()
        .map(|principal| PrincipalCascade {
            principal: principal.clone(),
            steps: ADVP_ORDER
                .iter()
                .filter(|&&advp| records.iter().any(|r| r.lead_time_days == Some(advp)))
                .map(|&advp| {
                    let slice: Vec<&OfferRecord> = records
                        .iter()
                        .filter(|r| r.lead_time_days == Some(advp))
                        .collect();
                    CascadeStep {
                        label: advp.to_string(),
                        gap_pct: slice_gap(&slice, principal),
                    }
                })
                .collect(),
        })
        .collect();

    let by_region = params
        .principals
        .iter()
        .map(|principal| PrincipalCascade {
            principal: principal.clone(),
            steps: catalog
                .iter()
                .filter_map(|(region, routes)| {
                    let slice: Vec<&OfferRecord> = records
                        .iter()
                        .filter(|r| {
                            r.route_normalized
                                .as_deref()
                                .is_some_and(|route| routes.contains(route))
                        })
                        .collect();
                    if slice.is_empty() {
                        return None;
                    }
                    Some(CascadeStep {
                        label: region.to_string(),
                        gap_pct: slice_gap(&slice, principal),
                    })
                })
                .collect(),
        })
        .collect();

    WaterfallsReport { by_advp, by_region }
}

/// Both principals are excluded from the competitor pool regardless of
/// the caller's selection; the series set force-includes them.
fn slice_gap(slice: &[&OfferRecord], principal: &str) -> Option<f64> {
    let means = mean_price_by_agency(slice.iter().copied());
    gap_vs_best(principal, &means, &principal_exclusions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgencyScope, CompetitorSelection, GroupingMode, LeadTimeFilter,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    fn create_test_offer(agency: &str, route: &str, advp: i64, price: f64) -> OfferRecord {
        OfferRecord {
            search_batch: None,
            airline: None,
            departure_time_1: None,
            departure_time_2: None,
            departure_time_3: None,
            flight_type: None,
            flight_date: None,
            search_timestamp: NaiveDateTime::parse_from_str(
                "2024-05-10 09:00:00",
                "%Y-%m-%d %H:%M:%S",
            )
            .ok(),
            agency: Some(agency.to_string()),
            price: Some(price),
            route_raw: Some(route.to_string()),
            lead_time_days: Some(advp),
            rank: Some(1),
            route_normalized: Some(crate::models::normalize_route(route)),
        }
    }

    fn create_test_params() -> FilterParams {
        FilterParams {
            region: None,
            agency_scope: AgencyScope::General,
            grouping: GroupingMode::Separate,
            principals: vec!["123MILHAS".to_string(), "MAXMILHAS".to_string()],
            competitors: CompetitorSelection::AllRemaining,
            route: None,
            lead_time: LeadTimeFilter::Range(0, 90),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        }
    }

    #[test]
    fn test_advp_cascade_in_canonical_order() {
        let records = vec![
            create_test_offer("123MILHAS", "GRU-REC", 30, 110.0),
            create_test_offer("GOL", "GRU-REC", 30, 100.0),
            create_test_offer("123MILHAS", "GRU-REC", 3, 95.0),
            create_test_offer("GOL", "GRU-REC", 3, 100.0),
        ];
        let report = compute(&records, &create_test_params(), &RegionCatalog::default());
        let cascade = &report.by_advp[0];
        assert_eq!(cascade.principal, "123MILHAS");
        // Present values only, in ADVP order.
        let labels: Vec<&str> = cascade.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["3", "30"]);
        assert!((cascade.steps[0].gap_pct.unwrap() + 5.0).abs() < 1e-9);
        assert!((cascade.steps[1].gap_pct.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_advp_off_grid_values_are_skipped() {
        let records = vec![
            create_test_offer("123MILHAS", "GRU-REC", 5, 110.0),
            create_test_offer("GOL", "GRU-REC", 5, 100.0),
        ];
        let report = compute(&records, &create_test_params(), &RegionCatalog::default());
        assert!(report.by_advp[0].steps.is_empty());
    }

    #[test]
    fn test_region_cascade_only_regions_with_rows() {
        let records = vec![
            // CWB-POA is SUL, BSB-GRU is CENTRO-OESTE.
            create_test_offer("123MILHAS", "CWB-POA", 7, 120.0),
            create_test_offer("GOL", "CWB-POA", 7, 100.0),
            create_test_offer("123MILHAS", "BSB-GRU", 7, 80.0),
            create_test_offer("GOL", "BSB-GRU", 7, 100.0),
        ];
        let report = compute(&records, &create_test_params(), &RegionCatalog::default());
        let cascade = &report.by_region[0];
        let labels: Vec<&str> = cascade.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["CENTRO-OESTE", "SUL"]);
        assert!((cascade.steps[0].gap_pct.unwrap() + 20.0).abs() < 1e-9);
        assert!((cascade.steps[1].gap_pct.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_suppressed_where_principal_absent_from_slice() {
        let records = vec![
            create_test_offer("123MILHAS", "GRU-REC", 7, 110.0),
            create_test_offer("GOL", "GRU-REC", 7, 100.0),
            create_test_offer("GOL", "GRU-REC", 14, 100.0),
        ];
        let report = compute(&records, &create_test_params(), &RegionCatalog::default());
        let cascade = &report.by_advp[0];
        assert_eq!(cascade.steps.len(), 2);
        assert!(cascade.steps[0].gap_pct.is_some());
        assert_eq!(cascade.steps[1].gap_pct, None);
    }

    #[test]
    fn test_other_principal_is_never_the_best_competitor() {
        // MAXMILHAS is cheapest, but it is not a competitor even when the
        // caller tracks only 123MILHAS.
        let records = vec![
            create_test_offer("123MILHAS", "GRU-REC", 7, 110.0),
            create_test_offer("MAXMILHAS", "GRU-REC", 7, 80.0),
            create_test_offer("GOL", "GRU-REC", 7, 100.0),
        ];
        let mut params = create_test_params();
        params.principals = vec!["123MILHAS".to_string()];
        let report = compute(&records, &params, &RegionCatalog::default());
        let step = &report.by_advp[0].steps[0];
        // Gap against GOL (100), not against MAXMILHAS (80).
        assert!((step.gap_pct.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let report = compute(&[], &create_test_params(), &RegionCatalog::default());
        assert_eq!(report.by_advp.len(), 2);
        assert!(report.by_advp.iter().all(|c| c.steps.is_empty()));
        assert!(report.by_region.iter().all(|c| c.steps.is_empty()));
    }
}
