//! # Tide Panel Application Entry Point
//!
//! Loads the configuration, runs the pipeline once and prints the three-day
//! panel to stdout. Logs go to stderr; set `RUST_LOG=debug` for parser detail.
//!
//! Usage: `tide-panel [CONFIG_PATH]` (defaults to `./tide-panel.toml`).

use std::env;
use tide_panel_lib::{config::Config, pipeline::run_pipeline, renderer::draw_ascii};
use tracing_subscriber::EnvFilter;

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    // Create Tokio runtime for the HTTP requests
    let rt = tokio::runtime::Runtime::new()?;

    // Producers degrade to "unavailable" on failure, so this never errors
    let model = rt.block_on(run_pipeline(&config));

    draw_ascii(&model);
    Ok(())
}
