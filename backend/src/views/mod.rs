//! One module per analytical view. Each exposes plain serializable
//! report types plus a `compute` function that turns a filtered working
//! set into view-ready tables and series. Empty input always yields an
//! empty (but well-formed) report.

pub mod day_periods;
pub mod overview;
pub mod rankings;
pub mod temporal;
pub mod top_routes;
pub mod waterfalls;
