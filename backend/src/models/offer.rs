//! One scraped price observation.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// A single airfare offer as observed by one scraping run.
///
/// Every field except `route_normalized` maps positionally to a source
/// column; fields the loader could not coerce are `None` and are skipped
/// by aggregations that need them (the row itself is retained).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRecord {
    /// Identifier of the scraping run this offer came from.
    pub search_batch: Option<String>,
    /// Operating carrier; not always populated.
    pub airline: Option<String>,
    /// Candidate flight times, up to three per offer.
    pub departure_time_1: Option<NaiveDateTime>,
    pub departure_time_2: Option<NaiveDateTime>,
    pub departure_time_3: Option<NaiveDateTime>,
    pub flight_type: Option<String>,
    pub flight_date: Option<NaiveDateTime>,
    /// When the offer was observed; drives all time filtering.
    pub search_timestamp: Option<NaiveDateTime>,
    /// Seller identity (agency name or airline-as-seller).
    pub agency: Option<String>,
    pub price: Option<f64>,
    /// Free-text origin-destination as scraped, e.g. `"GRU-REC"`.
    pub route_raw: Option<String>,
    /// Days between search and flight (ADVP).
    pub lead_time_days: Option<i64>,
    /// Competitive rank of this offer in its search context; 1 = best.
    pub rank: Option<i64>,
    /// Canonical `AAA-BBB` form of `route_raw`, derived once at load time.
    pub route_normalized: Option<String>,
}

impl OfferRecord {
    /// Price usable in aggregations: present and finite.
    pub fn priced(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite())
    }

    /// Calendar day of the search timestamp.
    pub fn search_day(&self) -> Option<NaiveDate> {
        self.search_timestamp.map(|ts| ts.date())
    }

    /// Search timestamp floored to the hour.
    pub fn search_hour(&self) -> Option<NaiveDateTime> {
        self.search_timestamp
            .and_then(|ts| ts.with_minute(0).and_then(|t| t.with_second(0)))
    }

    /// True when the agency field equals `name`.
    pub fn is_agency(&self, name: &str) -> bool {
        self.agency.as_deref() == Some(name)
    }
}
