#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime dashboard API server binary.
//!
//! Reads the TOML config named by `--config` (or `DASHBOARD_CONFIG`),
//! applies environment overrides, and serves the `/api` endpoints.

use std::path::PathBuf;

use clap::Parser;
use crime_dashboard_server::config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "crime_dashboard_server", about = "Crime dashboard API server")]
struct Args {
    /// Path to a TOML config file (falls back to `DASHBOARD_CONFIG`).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let args = Args::parse();
    let config = DashboardConfig::load(args.config.as_deref()).map_err(std::io::Error::other)?;

    crime_dashboard_server::run_server(config).await
}
