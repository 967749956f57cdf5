//! Core domain types: offer records, filter parameters, and the route
//! catalog. These are plain data carriers; all behavior lives in
//! [`crate::services`] and [`crate::views`].

pub mod filters;
pub mod offer;
pub mod routes;

pub use filters::{
    AgencyScope, CompetitorSelection, FilterParams, GroupingMode, LeadTimeFilter, ADVP_ORDER,
    DEFAULT_CARRIERS, GROUP_LABEL, PRINCIPAL_AGENCIES,
};
pub use offer::OfferRecord;
pub use routes::{expand_bidirectional, normalize_route, RegionCatalog};
