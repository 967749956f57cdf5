//! Analytical backend over scraped flight-offer price data.
//!
//! The crate loads a positional CSV snapshot of airfare offers, runs a
//! two-stage filter pipeline over it, and computes the tables and series
//! behind each dashboard view: competitive overview, rank participation,
//! winning routes, best price by time of day, gap cascades, and the
//! temporal evolution views. Rendering is someone else's job; everything
//! exported from [`api`] is plain serializable data.

pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod services;
pub mod views;

pub use error::LoadError;
