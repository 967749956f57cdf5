//! Competitive overview: principal mean prices, the competitor price
//! ladder, and one gap gauge per principal.

use serde::{Deserialize, Serialize};

use crate::models::{FilterParams, GroupingMode, GROUP_LABEL};
use crate::services::aggregate::{best_competitor_mean, gap_vs_best, mean_price_by_agency};
use crate::services::filters::FilteredSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyMean {
    pub agency: String,
    pub mean_price: f64,
}

/// One gauge: how far a principal sits above (positive) or below
/// (negative) the cheapest competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapGauge {
    pub principal: String,
    pub gap_pct: Option<f64>,
    pub best_competitor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewReport {
    /// One entry per tracked principal; grouped mode collapses both into
    /// a single Grupo123 entry. Principals without priced rows are absent.
    pub principal_means: Vec<AgencyMean>,
    /// Everyone else, cheapest first.
    pub competitor_means: Vec<AgencyMean>,
    pub gauges: Vec<GapGauge>,
}

pub fn compute(set: &FilteredSet, params: &FilterParams) -> OverviewReport {
    let principals = effective_principals(params);
    let means = mean_price_by_agency(&set.fully_filtered);

    let principal_means: Vec<AgencyMean> = principals
        .iter()
        .filter_map(|p| {
            means.get(p).map(|&mean_price| AgencyMean {
                agency: p.clone(),
                mean_price,
            })
        })
        .collect();

    let mut competitor_means: Vec<AgencyMean> = means
        .iter()
        .filter(|(agency, _)| !principals.contains(agency))
        .map(|(agency, &mean_price)| AgencyMean {
            agency: agency.clone(),
            mean_price,
        })
        .collect();
    competitor_means.sort_by(|a, b| {
        a.mean_price
            .partial_cmp(&b.mean_price)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.agency.cmp(&b.agency))
    });

    let gauges = principals
        .iter()
        .map(|p| GapGauge {
            principal: p.clone(),
            gap_pct: gap_vs_best(p, &means, &principals),
            best_competitor: best_competitor_mean(&means, &principals)
                .map(|(name, _)| name.to_string()),
        })
        .collect();

    OverviewReport {
        principal_means,
        competitor_means,
        gauges,
    }
}

fn effective_principals(params: &FilterParams) -> Vec<String> {
    match params.grouping {
        GroupingMode::Grouped => vec![GROUP_LABEL.to_string()],
        GroupingMode::Separate => params.principals.clone(),
    }
}
