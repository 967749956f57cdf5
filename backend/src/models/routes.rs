//! Route canonicalization and the regional route catalog.
//!
//! Scraped route labels arrive in many spellings (`"gru—rec"`, `"GRU/REC"`,
//! `"GRU - REC"`); everything downstream compares the canonical
//! `ORIGIN-DEST` form produced by [`normalize_route`]. Regions are curated
//! sets of those canonical codes, closed under direction reversal.

use std::collections::BTreeSet;

const NORTE: [&str; 21] = [
    "BEL-GRU", "BEL-GIG", "BEL-GRU", "BEL-MCP", "BEL-STM", "BEL-FOR", "BEL-MAO", "BEL-REC",
    "BEL-CWB", "BEL-FLN", "BEL-CNF", "BEL-NVT", "BEL-SDU", "CKS-CNF", "MAO-STM", "MAO-TBT",
    "MAO-VCP", "MAO-REC", "MAO-PVH", "MAO-TFF", "FOR-MAO",
];

const NORDESTE: [&str; 25] = [
    "AJU-GRU", "AJU-GIG", "AJU-VCP", "AJU-CGH", "AJU-CNF", "BPS-CNF", "BPS-CGH", "BPS-GRU",
    "FOR-GRU", "FOR-GIG", "FOR-REC", "FOR-VCP", "FOR-SSA", "GYN-MCZ", "GYN-REC", "GYN-VCP",
    "GYN-SDU", "JDO-VCP", "MCZ-VCP", "PNZ-VCP", "REC-SSA", "REC-VCP", "REC-VIX", "SSA-VCP",
    "SSA-VIX",
];

const CENTRO_OESTE: [&str; 19] = [
    "BSB-CGH", "BSB-REC", "BSB-SDU", "BSB-GIG", "BSB-SSA", "BSB-VCP", "BSB-CNF", "BSB-GRU",
    "BSB-NAT", "BSB-THE", "BSB-SLZ", "BSB-FOR", "BSB-CGB", "BSB-CWB", "BSB-VIX", "BSB-JPA",
    "CGB-GRU", "CGR-GRU", "CGR-VCP",
];

const SUDESTE: [&str; 34] = [
    "CAC-GRU", "CGH-SDU", "CGH-SSA", "CGH-REC", "CGH-CNF", "CGH-CWB", "CGH-POA", "CGH-FLN",
    "CGH-GYN", "CGH-NVT", "CGH-FOR", "CGH-MCZ", "CGH-VIX", "CGH-GIG", "CGH-THE", "CGH-JPA",
    "CGH-NAT", "CGH-CGR", "CNF-SSA", "CNF-GIG", "CNF-GRU", "CNF-REC", "CNF-FOR", "CNF-SLZ",
    "CNF-MAO", "CNF-CWB", "CNF-FLN", "CNF-VCP", "CNF-MCZ", "CNF-NAT", "CNF-VIX", "CNF-POA",
    "CNF-THE", "CNF-SLZ",
];

const SUL: [&str; 11] = [
    "CWB-GIG", "CWB-MAO", "CWB-SSA", "CWB-POA", "CWB-IGU", "CWB-REC", "CWB-SDU", "FLN-GIG",
    "FLN-SDU", "FLN-MAO", "FLN-SSA",
];

/// Canonicalize a free-text route label into `AAA-BBB` form.
///
/// Deterministic and idempotent: `normalize_route(normalize_route(x))`
/// equals `normalize_route(x)` for any input.
pub fn normalize_route(raw: &str) -> String {
    let mut s = raw.trim().to_uppercase();
    s = s.replace(['\u{2014}', '\u{2013}', '/'], "-");
    s.retain(|c| !c.is_whitespace());

    // Maximal alphabetic runs of exactly three letters are airport codes.
    let codes: Vec<&str> = letter_runs(&s)
        .into_iter()
        .filter(|run| run.len() == 3)
        .collect();
    if codes.len() >= 2 {
        return format!("{}-{}", codes[0], codes[1]);
    }

    // Fallback: collapse every non-letter run to a single dash.
    let mut out = String::with_capacity(s.len());
    let mut last_dash = false;
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Maximal runs of ASCII uppercase letters in `s`.
fn letter_runs(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut runs = Vec::new();
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_uppercase() {
            start.get_or_insert(i);
        } else if let Some(st) = start.take() {
            runs.push(&s[st..i]);
        }
    }
    if let Some(st) = start {
        runs.push(&s[st..]);
    }
    runs
}

/// Expand route pairs to include both directions.
///
/// Blank entries are skipped; entries without a dash are kept as-is.
pub fn expand_bidirectional<I, S>(pairs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for pair in pairs {
        let t = pair.as_ref().trim();
        if t.is_empty() {
            continue;
        }
        set.insert(t.to_string());
        if let Some((a, b)) = t.split_once('-') {
            set.insert(format!("{}-{}", b, a));
        }
    }
    set
}

/// The five fixed regions over the curated route list.
///
/// Membership sets hold normalized codes, so lookups must use
/// [`normalize_route`] output. Routes absent from every region are simply
/// not part of region-based slices.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<(String, BTreeSet<String>)>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        let raw: [(&str, &[&str]); 5] = [
            ("NORTE", &NORTE),
            ("NORDESTE", &NORDESTE),
            ("CENTRO-OESTE", &CENTRO_OESTE),
            ("SUDESTE", &SUDESTE),
            ("SUL", &SUL),
        ];
        let regions = raw
            .into_iter()
            .map(|(name, routes)| {
                let set = expand_bidirectional(routes.iter().copied())
                    .into_iter()
                    .map(|r| normalize_route(&r))
                    .collect();
                (name.to_string(), set)
            })
            .collect();
        RegionCatalog { regions }
    }
}

impl RegionCatalog {
    /// Region names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|(n, _)| n.as_str())
    }

    /// Membership set for a region, if it exists.
    pub fn routes(&self, region: &str) -> Option<&BTreeSet<String>> {
        self.regions
            .iter()
            .find(|(n, _)| n == region)
            .map(|(_, set)| set)
    }

    /// Iterate regions in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.regions.iter().map(|(n, set)| (n.as_str(), set))
    }
}
