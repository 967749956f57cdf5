//! Rank participation: who occupies each rank position, in counts and in
//! row/column percentages.

use serde::{Deserialize, Serialize};

use crate::services::aggregate::{rank_counts, within_agency_share, within_rank_share};
use crate::services::filters::FilteredSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub agency: String,
    /// Counts aligned with [`RankingsReport::ranks`].
    pub counts: Vec<u64>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentRow {
    pub agency: String,
    /// Percentages aligned with [`RankingsReport::ranks`]; `None` where
    /// the agency has no offers at that rank.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingsReport {
    /// Rank positions present in the slice, ascending.
    pub ranks: Vec<i64>,
    /// Rows ordered by rank-1 count descending, then by name.
    pub rows: Vec<RankingRow>,
    pub column_totals: Vec<u64>,
    pub grand_total: u64,
    /// Row percentages: each agency's distribution across ranks.
    pub within_agency_pct: Vec<PercentRow>,
    /// Column percentages: each agency's share of one rank position.
    pub within_rank_pct: Vec<PercentRow>,
}

pub fn compute(set: &FilteredSet) -> RankingsReport {
    let counts = rank_counts(&set.fully_filtered);

    let mut ranks: Vec<i64> = counts
        .values()
        .flat_map(|per_rank| per_rank.keys().copied())
        .collect();
    ranks.sort_unstable();
    ranks.dedup();

    let mut rows: Vec<RankingRow> = counts
        .iter()
        .map(|(agency, per_rank)| {
            let counts: Vec<u64> = ranks
                .iter()
                .map(|r| per_rank.get(r).copied().unwrap_or(0))
                .collect();
            let total = counts.iter().sum();
            RankingRow {
                agency: agency.clone(),
                counts,
                total,
            }
        })
        .collect();
    let rank1_idx = ranks.iter().position(|&r| r == 1);
    rows.sort_by(|a, b| {
        let first = |row: &RankingRow| rank1_idx.map(|i| row.counts[i]).unwrap_or(0);
        first(b).cmp(&first(a)).then_with(|| a.agency.cmp(&b.agency))
    });

    let column_totals: Vec<u64> = ranks
        .iter()
        .enumerate()
        .map(|(i, _)| rows.iter().map(|row| row.counts[i]).sum())
        .collect();
    let grand_total = column_totals.iter().sum();

    let agency_shares = within_agency_share(&counts);
    let rank_shares = within_rank_share(&counts);
    let within_agency_pct = rows
        .iter()
        .map(|row| PercentRow {
            agency: row.agency.clone(),
            values: ranks
                .iter()
                .map(|r| {
                    agency_shares
                        .get(&row.agency)
                        .and_then(|shares| shares.get(r).copied())
                })
                .collect(),
        })
        .collect();
    let within_rank_pct = rows
        .iter()
        .map(|row| PercentRow {
            agency: row.agency.clone(),
            values: ranks
                .iter()
                .map(|r| {
                    rank_shares
                        .get(r)
                        .and_then(|shares| shares.get(&row.agency).copied())
                })
                .collect(),
        })
        .collect();

    RankingsReport {
        ranks,
        rows,
        column_totals,
        grand_total,
        within_agency_pct,
        within_rank_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OfferRecord;
    use chrono::NaiveDateTime;

    fn create_test_offer(agency: &str, rank: Option<i64>) -> OfferRecord {
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
            price: Some(100.0),
            route_raw: Some("GRU-REC".to_string()),
            lead_time_days: Some(7),
            rank,
            route_normalized: Some("GRU-REC".to_string()),
        }
    }

    fn report_for(records: Vec<OfferRecord>) -> RankingsReport {
        compute(&FilteredSet {
            region_scoped: records.clone(),
            fully_filtered: records,
        })
    }

    #[test]
    fn test_matrix_counts_and_order() {
        let report = report_for(vec![
            create_test_offer("GOL", Some(1)),
            create_test_offer("123MILHAS", Some(1)),
            create_test_offer("123MILHAS", Some(1)),
            create_test_offer("123MILHAS", Some(2)),
            create_test_offer("GOL", Some(3)),
            create_test_offer("AZUL", None),
        ]);

        assert_eq!(report.ranks, vec![1, 2, 3]);
        // Rank-1 leader first.
        assert_eq!(report.rows[0].agency, "123MILHAS");
        assert_eq!(report.rows[0].counts, vec![2, 1, 0]);
        assert_eq!(report.rows[0].total, 3);
        assert_eq!(report.rows[1].agency, "GOL");
        assert_eq!(report.column_totals, vec![3, 1, 1]);
        assert_eq!(report.grand_total, 5);
        // The rankless AZUL row contributes nothing.
        assert!(report.rows.iter().all(|r| r.agency != "AZUL"));
    }

    #[test]
    fn test_within_rank_columns_sum_to_100() {
        let report = report_for(vec![
            create_test_offer("GOL", Some(1)),
            create_test_offer("123MILHAS", Some(1)),
            create_test_offer("123MILHAS", Some(1)),
            create_test_offer("GOL", Some(2)),
        ]);
        for (i, _) in report.ranks.iter().enumerate() {
            let sum: f64 = report
                .within_rank_pct
                .iter()
                .filter_map(|row| row.values[i])
                .sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_within_agency_rows_sum_to_100() {
        let report = report_for(vec![
            create_test_offer("GOL", Some(1)),
            create_test_offer("GOL", Some(2)),
            create_test_offer("GOL", Some(2)),
        ]);
        let row = &report.within_agency_pct[0];
        let sum: f64 = row.values.iter().flatten().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((row.values[0].unwrap() - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_empty_input() {
        let report = report_for(vec![]);
        assert!(report.ranks.is_empty());
        assert!(report.rows.is_empty());
        assert_eq!(report.grand_total, 0);
    }
}
