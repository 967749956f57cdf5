//! Price aggregation and competitive-gap primitives.
//!
//! All means ignore rows whose price is missing or non-finite. Gaps are
//! suppressed (`None`) rather than reported as zero whenever they cannot
//! be computed honestly: no priced target rows, no competitors in the
//! slice, or a zero best mean that would divide out to nonsense.

use std::collections::BTreeMap;

use crate::models::{OfferRecord, GROUP_LABEL, PRINCIPAL_AGENCIES};

/// Labels never counted as competitors: both principals plus the
/// grouped label their rows may carry.
pub fn principal_exclusions() -> Vec<String> {
    PRINCIPAL_AGENCIES
        .iter()
        .map(|p| p.to_string())
        .chain([GROUP_LABEL.to_string()])
        .collect()
}

/// Mean of the usable prices in a slice, or `None` when there are none.
pub fn mean_price<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a OfferRecord>,
{
    let mut sum = 0.0;
    let mut n = 0usize;
    for record in records {
        if let Some(price) = record.priced() {
            sum += price;
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Per-agency mean price over a slice. Agencies with no usable prices
/// are absent from the result.
pub fn mean_price_by_agency<'a, I>(records: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a OfferRecord>,
{
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let (Some(agency), Some(price)) = (record.agency.as_deref(), record.priced()) {
            let entry = sums.entry(agency).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(agency, (sum, n))| (agency.to_string(), sum / n as f64))
        .collect()
}

/// Cheapest competitor and its mean, where a competitor is any agency in
/// `by_agency` not listed in `excluded`. Ties resolve to the
/// alphabetically first agency.
pub fn best_competitor_mean<'a>(
    by_agency: &'a BTreeMap<String, f64>,
    excluded: &[String],
) -> Option<(&'a str, f64)> {
    by_agency
        .iter()
        .filter(|(agency, _)| !excluded.iter().any(|e| e == *agency))
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(agency, mean)| (agency.as_str(), *mean))
}

/// Percentage gap of `target`'s mean against the cheapest competitor.
///
/// Positive means the target is more expensive than the best competitor.
/// `None` when the target has no mean, no competitors remain, or the
/// best competitor mean is zero.
pub fn gap_vs_best(
    target: &str,
    by_agency: &BTreeMap<String, f64>,
    excluded: &[String],
) -> Option<f64> {
    let target_mean = *by_agency.get(target)?;
    let (_, best) = best_competitor_mean(by_agency, excluded)?;
    if best == 0.0 {
        return None;
    }
    Some((target_mean - best) / best * 100.0)
}

/// Offer counts per agency per rank position.
pub fn rank_counts<'a, I>(records: I) -> BTreeMap<String, BTreeMap<i64, u64>>
where
    I: IntoIterator<Item = &'a OfferRecord>,
{
    let mut counts: BTreeMap<String, BTreeMap<i64, u64>> = BTreeMap::new();
    for record in records {
        if let (Some(agency), Some(rank)) = (record.agency.as_deref(), record.rank) {
            *counts
                .entry(agency.to_string())
                .or_default()
                .entry(rank)
                .or_insert(0) += 1;
        }
    }
    counts
}

/// Share of each agency within one rank position (columns sum to 100).
pub fn within_rank_share(
    counts: &BTreeMap<String, BTreeMap<i64, u64>>,
) -> BTreeMap<i64, BTreeMap<String, f64>> {
    let mut totals: BTreeMap<i64, u64> = BTreeMap::new();
    for ranks in counts.values() {
        for (&rank, &n) in ranks {
            *totals.entry(rank).or_insert(0) += n;
        }
    }

    let mut shares: BTreeMap<i64, BTreeMap<String, f64>> = BTreeMap::new();
    for (agency, ranks) in counts {
        for (&rank, &n) in ranks {
            let total = totals[&rank];
            if total > 0 {
                shares
                    .entry(rank)
                    .or_default()
                    .insert(agency.clone(), n as f64 / total as f64 * 100.0);
            }
        }
    }
    shares
}

/// Distribution of one agency's offers across rank positions (rows sum
/// to 100).
pub fn within_agency_share(
    counts: &BTreeMap<String, BTreeMap<i64, u64>>,
) -> BTreeMap<String, BTreeMap<i64, f64>> {
    counts
        .iter()
        .filter_map(|(agency, ranks)| {
            let total: u64 = ranks.values().sum();
            if total == 0 {
                return None;
            }
            let row = ranks
                .iter()
                .map(|(&rank, &n)| (rank, n as f64 / total as f64 * 100.0))
                .collect();
            Some((agency.clone(), row))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_offer(agency: &str, price: Option<f64>, rank: Option<i64>) -> OfferRecord {
        OfferRecord {
            search_batch: None,
            airline: None,
            departure_time_1: None,
            departure_time_2: None,
            departure_time_3: None,
            flight_type: None,
            flight_date: None,
            search_timestamp: None,
            agency: Some(agency.to_string()),
            price,
            route_raw: Some("GRU-REC".to_string()),
            lead_time_days: Some(7),
            rank,
            route_normalized: Some("GRU-REC".to_string()),
        }
    }

    #[test]
    fn test_mean_price_skips_unusable() {
        let records = vec![
            create_test_offer("GOL", Some(100.0), None),
            create_test_offer("GOL", Some(200.0), None),
            create_test_offer("GOL", None, None),
            create_test_offer("GOL", Some(f64::NAN), None),
        ];
        assert_eq!(mean_price(&records), Some(150.0));
        assert_eq!(mean_price(&[] as &[OfferRecord]), None);
    }

    #[test]
    fn test_mean_price_by_agency() {
        let records = vec![
            create_test_offer("GOL", Some(100.0), None),
            create_test_offer("GOL", Some(300.0), None),
            create_test_offer("AZUL", Some(250.0), None),
            create_test_offer("AZUL", None, None),
        ];
        let means = mean_price_by_agency(&records);
        assert_eq!(means["GOL"], 200.0);
        assert_eq!(means["AZUL"], 250.0);
        assert_eq!(means.len(), 2);
    }

    #[test]
    fn test_gap_vs_best_worked_example() {
        let records = vec![
            create_test_offer("123MILHAS", Some(100.0), None),
            create_test_offer("MAXMILHAS", Some(120.0), None),
            create_test_offer("COMP_A", Some(90.0), None),
            create_test_offer("COMP_B", Some(110.0), None),
        ];
        let means = mean_price_by_agency(&records);
        let excluded = vec!["123MILHAS".to_string(), "MAXMILHAS".to_string()];
        let gap = gap_vs_best("123MILHAS", &means, &excluded).unwrap();
        assert!((gap - 11.111).abs() < 0.01);
        let gap_max = gap_vs_best("MAXMILHAS", &means, &excluded).unwrap();
        assert!((gap_max - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_gap_suppressed_without_competitors() {
        let records = vec![create_test_offer("123MILHAS", Some(100.0), None)];
        let means = mean_price_by_agency(&records);
        let excluded = vec!["123MILHAS".to_string()];
        assert_eq!(gap_vs_best("123MILHAS", &means, &excluded), None);
    }

    #[test]
    fn test_gap_suppressed_for_unpriced_target() {
        let records = vec![
            create_test_offer("123MILHAS", None, None),
            create_test_offer("COMP_A", Some(90.0), None),
        ];
        let means = mean_price_by_agency(&records);
        let excluded = vec!["123MILHAS".to_string()];
        assert_eq!(gap_vs_best("123MILHAS", &means, &excluded), None);
    }

    #[test]
    fn test_gap_suppressed_on_zero_best() {
        let records = vec![
            create_test_offer("123MILHAS", Some(100.0), None),
            create_test_offer("COMP_A", Some(0.0), None),
        ];
        let means = mean_price_by_agency(&records);
        let excluded = vec!["123MILHAS".to_string()];
        assert_eq!(gap_vs_best("123MILHAS", &means, &excluded), None);
    }

    #[test]
    fn test_best_competitor_tie_is_alphabetical() {
        let mut means = BTreeMap::new();
        means.insert("ZETA".to_string(), 90.0);
        means.insert("ALFA".to_string(), 90.0);
        means.insert("123MILHAS".to_string(), 100.0);
        let excluded = vec!["123MILHAS".to_string()];
        let (name, mean) = best_competitor_mean(&means, &excluded).unwrap();
        assert_eq!(name, "ALFA");
        assert_eq!(mean, 90.0);
    }

    #[test]
    fn test_principal_exclusions_cover_group_label() {
        let excluded = principal_exclusions();
        assert!(excluded.iter().any(|e| e == "123MILHAS"));
        assert!(excluded.iter().any(|e| e == "MAXMILHAS"));
        assert!(excluded.iter().any(|e| e == GROUP_LABEL));
    }

    #[test]
    fn test_rank_shares() {
        let records = vec![
            create_test_offer("123MILHAS", Some(1.0), Some(1)),
            create_test_offer("123MILHAS", Some(1.0), Some(1)),
            create_test_offer("123MILHAS", Some(1.0), Some(2)),
            create_test_offer("GOL", Some(1.0), Some(1)),
            create_test_offer("GOL", Some(1.0), None),
        ];
        let counts = rank_counts(&records);
        assert_eq!(counts["123MILHAS"][&1], 2);
        assert_eq!(counts["GOL"][&1], 1);

        let by_rank = within_rank_share(&counts);
        assert!((by_rank[&1]["123MILHAS"] - 66.666).abs() < 0.01);
        assert!((by_rank[&1]["GOL"] - 33.333).abs() < 0.01);

        let by_agency = within_agency_share(&counts);
        assert!((by_agency["123MILHAS"][&1] - 66.666).abs() < 0.01);
        assert!((by_agency["123MILHAS"][&2] - 33.333).abs() < 0.01);
        assert_eq!(by_agency["GOL"][&1], 100.0);
    }
}
