//! Report generator binary.
//!
//! Loads the offer snapshot, runs one analytical view over the full data
//! span, and prints the report as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # View name is the first argument
//! cargo run --bin ofertas-report -- overview
//!
//! # Temporal view takes an optional granularity
//! cargo run --bin ofertas-report -- temporal biweekly
//!
//! # Point at a specific snapshot
//! OFERTAS_PATH=/srv/ofertas/OFERTAS.csv cargo run --bin ofertas-report -- rankings
//! ```
//!
//! # Environment Variables
//!
//! - `OFERTAS_PATH`: snapshot CSV location (falls back to `ofertas.toml`
//!   and the conventional candidates)
//! - `RUST_LOG`: log level (default: info)

use std::env;
use std::process::ExitCode;

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ofertas_rust::api::{FilterParams, PeriodGranularity, RegionCatalog};
use ofertas_rust::config;
use ofertas_rust::loader;
use ofertas_rust::services::filters::{apply_filters, apply_filters_for_timeseries};
use ofertas_rust::views::{day_periods, overview, rankings, temporal, top_routes, waterfalls};

const VIEWS: [&str; 7] = [
    "summary",
    "overview",
    "rankings",
    "top-routes",
    "day-periods",
    "waterfalls",
    "temporal",
];

fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("ofertas-report: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let view = args.first().map(String::as_str).unwrap_or("summary");
    if !VIEWS.contains(&view) {
        anyhow::bail!("unknown view {view:?}; expected one of {}", VIEWS.join(", "));
    }

    let path = config::discover_data_path()
        .ok_or_else(|| anyhow::anyhow!("no data source configured; set OFERTAS_PATH"))?;
    let snapshot = loader::load_snapshot_cached(&path)?;
    info!(rows = snapshot.len(), view, "computing report");

    let catalog = RegionCatalog::default();
    let params = FilterParams::full_span(&snapshot.records);

    let json = match view {
        "summary" => serde_json::to_string_pretty(&snapshot.summary())?,
        "overview" => {
            let set = apply_filters(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&overview::compute(&set, &params))?
        }
        "rankings" => {
            let set = apply_filters(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&rankings::compute(&set))?
        }
        "day-periods" => {
            let set = apply_filters(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&day_periods::compute(&set, &params))?
        }
        "top-routes" => {
            let series = apply_filters_for_timeseries(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&top_routes::compute(&series, &params.principals))?
        }
        "waterfalls" => {
            let series = apply_filters_for_timeseries(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&waterfalls::compute(&series, &params, &catalog))?
        }
        "temporal" => {
            let granularity = match args.get(1).map(String::as_str) {
                None | Some("weekly") => PeriodGranularity::Weekly,
                Some("biweekly") => PeriodGranularity::Biweekly,
                Some("monthly") => PeriodGranularity::Monthly,
                Some(other) => anyhow::bail!(
                    "unknown granularity {other:?}; expected weekly, biweekly or monthly"
                ),
            };
            let series = apply_filters_for_timeseries(&snapshot.records, &params, &catalog);
            serde_json::to_string_pretty(&temporal::compute(
                &series,
                &params,
                &catalog,
                granularity,
            ))?
        }
        _ => unreachable!(),
    };

    println!("{json}");
    Ok(())
}
