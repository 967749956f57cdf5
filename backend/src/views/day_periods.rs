//! Best price by departure hour and by period of the day.
//!
//! The hour axis comes from the offer's first departure time, not from
//! the search timestamp: this view asks "when is it cheap to fly", not
//! "when was it cheap to search".

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::models::{FilterParams, GroupingMode, OfferRecord, GROUP_LABEL};
use crate::services::filters::FilteredSet;

/// Display labels for the four day periods, in day order.
pub const DAY_PERIODS: [&str; 4] = ["Madrugada", "Manhã", "Tarde", "Noite"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSeries {
    pub agency: String,
    /// Min price per hour, aligned with [`DayPeriodsReport::hours`].
    pub min_prices: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyMin {
    pub agency: String,
    pub min_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPeriodMin {
    pub label: String,
    pub best_overall: Option<f64>,
    pub per_principal: Vec<AgencyMin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPeriodsReport {
    /// Always the full 0..=23 axis.
    pub hours: Vec<u32>,
    /// Cheapest offer from anyone, per hour.
    pub best_overall: Vec<Option<f64>>,
    /// One series per principal.
    pub series: Vec<HourSeries>,
    /// The same data folded into the four day periods.
    pub day_periods: Vec<DayPeriodMin>,
}

/// Day-period label for an hour of day.
pub fn day_period(hour: u32) -> &'static str {
    match hour {
        0..=5 => DAY_PERIODS[0],
        6..=11 => DAY_PERIODS[1],
        12..=17 => DAY_PERIODS[2],
        _ => DAY_PERIODS[3],
    }
}

pub fn compute(set: &FilteredSet, params: &FilterParams) -> DayPeriodsReport {
    let hours: Vec<u32> = (0..24).collect();
    // Grouped mode rewrote the principal rows to Grupo123; the series
    // labels must follow.
    let principals = effective_principals(params);

    let best_overall: Vec<Option<f64>> = hours
        .iter()
        .map(|&h| hourly_min(&set.fully_filtered, h, None))
        .collect();

    let series: Vec<HourSeries> = principals
        .iter()
        .map(|p| HourSeries {
            agency: p.clone(),
            min_prices: hours
                .iter()
                .map(|&h| hourly_min(&set.fully_filtered, h, Some(p)))
                .collect(),
        })
        .collect();

    let day_periods = DAY_PERIODS
        .iter()
        .map(|&label| DayPeriodMin {
            label: label.to_string(),
            best_overall: period_min(&set.fully_filtered, label, None),
            per_principal: principals
                .iter()
                .map(|p| AgencyMin {
                    agency: p.clone(),
                    min_price: period_min(&set.fully_filtered, label, Some(p)),
                })
                .collect(),
        })
        .collect();

    DayPeriodsReport {
        hours,
        best_overall,
        series,
        day_periods,
    }
}

fn effective_principals(params: &FilterParams) -> Vec<String> {
    match params.grouping {
        GroupingMode::Grouped => vec![GROUP_LABEL.to_string()],
        GroupingMode::Separate => params.principals.clone(),
    }
}

fn departure_hour(record: &OfferRecord) -> Option<u32> {
    record.departure_time_1.map(|t| t.hour())
}

fn hourly_min(records: &[OfferRecord], hour: u32, agency: Option<&str>) -> Option<f64> {
    records
        .iter()
        .filter(|r| departure_hour(r) == Some(hour))
        .filter(|r| agency.map_or(true, |a| r.is_agency(a)))
        .filter_map(|r| r.priced())
        .fold(None, |acc, p| Some(acc.map_or(p, |m: f64| m.min(p))))
}

fn period_min(records: &[OfferRecord], label: &str, agency: Option<&str>) -> Option<f64> {
    records
        .iter()
        .filter(|r| departure_hour(r).map(day_period) == Some(label))
        .filter(|r| agency.map_or(true, |a| r.is_agency(a)))
        .filter_map(|r| r.priced())
        .fold(None, |acc, p| Some(acc.map_or(p, |m: f64| m.min(p))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgencyScope, CompetitorSelection, GroupingMode, LeadTimeFilter,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    fn create_test_offer(agency: &str, departure: &str, price: f64) -> OfferRecord {
        OfferRecord {
            search_batch: None,
            airline: None,
            departure_time_1: NaiveDateTime::parse_from_str(departure, "%Y-%m-%d %H:%M:%S").ok(),
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
            route_raw: Some("GRU-REC".to_string()),
            lead_time_days: Some(7),
            rank: Some(1),
            route_normalized: Some("GRU-REC".to_string()),
        }
    }

    fn create_test_params() -> FilterParams {
        FilterParams {
            region: None,
            agency_scope: AgencyScope::General,
            grouping: GroupingMode::Separate,
            principals: vec!["123MILHAS".to_string()],
            competitors: CompetitorSelection::AllRemaining,
            route: None,
            lead_time: LeadTimeFilter::Range(0, 90),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        }
    }

    fn report_for(records: Vec<OfferRecord>) -> DayPeriodsReport {
        let set = FilteredSet {
            region_scoped: records.clone(),
            fully_filtered: records,
        };
        compute(&set, &create_test_params())
    }

    #[test]
    fn test_day_period_boundaries() {
        assert_eq!(day_period(0), "Madrugada");
        assert_eq!(day_period(5), "Madrugada");
        assert_eq!(day_period(6), "Manhã");
        assert_eq!(day_period(11), "Manhã");
        assert_eq!(day_period(12), "Tarde");
        assert_eq!(day_period(17), "Tarde");
        assert_eq!(day_period(18), "Noite");
        assert_eq!(day_period(23), "Noite");
    }

    #[test]
    fn test_hourly_minimums() {
        let report = report_for(vec![
            create_test_offer("123MILHAS", "2024-05-15 08:10:00", 300.0),
            create_test_offer("GOL", "2024-05-15 08:45:00", 250.0),
            create_test_offer("123MILHAS", "2024-05-15 20:00:00", 180.0),
        ]);
        assert_eq!(report.hours.len(), 24);
        assert_eq!(report.best_overall[8], Some(250.0));
        assert_eq!(report.best_overall[20], Some(180.0));
        assert_eq!(report.best_overall[9], None);

        let principal = &report.series[0];
        assert_eq!(principal.agency, "123MILHAS");
        assert_eq!(principal.min_prices[8], Some(300.0));
        assert_eq!(principal.min_prices[20], Some(180.0));
    }

    #[test]
    fn test_day_period_fold() {
        let report = report_for(vec![
            create_test_offer("123MILHAS", "2024-05-15 07:00:00", 300.0),
            create_test_offer("GOL", "2024-05-15 10:00:00", 250.0),
            create_test_offer("GOL", "2024-05-15 02:00:00", 400.0),
        ]);
        let morning = report
            .day_periods
            .iter()
            .find(|p| p.label == "Manhã")
            .unwrap();
        assert_eq!(morning.best_overall, Some(250.0));
        assert_eq!(morning.per_principal[0].min_price, Some(300.0));

        let night = report
            .day_periods
            .iter()
            .find(|p| p.label == "Noite")
            .unwrap();
        assert_eq!(night.best_overall, None);
    }

    #[test]
    fn test_grouped_mode_tracks_the_group_label() {
        let records = vec![
            create_test_offer("123MILHAS", "2024-05-15 08:00:00", 300.0),
            create_test_offer("MAXMILHAS", "2024-05-15 08:30:00", 280.0),
            create_test_offer("GOL", "2024-05-15 08:45:00", 250.0),
        ];
        let mut params = create_test_params();
        params.grouping = GroupingMode::Grouped;
        params.principals = vec!["123MILHAS".to_string(), "MAXMILHAS".to_string()];
        let set = crate::services::filters::apply_filters(
            &records,
            &params,
            &crate::models::RegionCatalog::default(),
        );
        let report = compute(&set, &params);

        assert_eq!(report.series.len(), 1);
        assert_eq!(report.series[0].agency, GROUP_LABEL);
        assert_eq!(report.series[0].min_prices[8], Some(280.0));
        let morning = report
            .day_periods
            .iter()
            .find(|p| p.label == "Manhã")
            .unwrap();
        assert_eq!(morning.per_principal[0].agency, GROUP_LABEL);
        assert_eq!(morning.per_principal[0].min_price, Some(280.0));
    }

    #[test]
    fn test_offers_without_departure_time_are_ignored() {
        let mut record = create_test_offer("GOL", "2024-05-15 08:00:00", 250.0);
        record.departure_time_1 = None;
        let report = report_for(vec![record]);
        assert!(report.best_overall.iter().all(|v| v.is_none()));
        assert!(report
            .day_periods
            .iter()
            .all(|p| p.best_overall.is_none()));
    }
}
