//! # Surf Tracker Application Entry Point
//!
//! This binary crate wires configuration, logging and the runtime together.
//! It supports server mode (HTTP endpoint plus background pollers, the default) and a
//! one-shot terminal report (`--stdout`) that polls every spot once and prints cards.
//!
//! Flags:
//! - `--config <path>`: config file (default `surf-config.toml`)
//! - `--stdout`: print a report instead of serving
//! - `--init-config`: write the default config to the config path and exit

// Test modules
#[cfg(test)]
mod tests;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use surf_report_lib::config::{Config, DEFAULT_CONFIG_PATH};
use surf_report_lib::forecast_client::ForecastClient;
use surf_report_lib::poller::PollState;
use surf_report_lib::renderer::draw_ascii;
use surf_report_lib::server::{self, SpotBoard};
use surf_report_lib::spots::SpotRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long the terminal report waits for each spot's first fetch
const REPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Value following `flag` on the command line, if any.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Poll every spot once and print the cards.
async fn run_report(config: Config, registry: Arc<SpotRegistry>) -> anyhow::Result<()> {
    let client = Arc::new(ForecastClient::new(&config.upstream)?);
    let board = SpotBoard::start(Arc::clone(&registry), client, &config);

    for poller in board.pollers() {
        let mut rx = poller.subscribe();
        let settled = tokio::time::timeout(
            REPORT_TIMEOUT,
            rx.wait_for(|s| matches!(s.state, PollState::Ready | PollState::Failed)),
        )
        .await;
        if settled.is_err() {
            tracing::warn!(spot = poller.spot_name(), "Timed out waiting for forecast");
        }
    }

    draw_ascii(
        registry
            .iter()
            .zip(board.pollers().iter().map(|p| p.snapshot())),
        &config.display,
    );
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Load .env so the API key can live next to the binary
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "surf_tracker=info,surf_report_lib=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let config_path = arg_value(&args, "--config").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let report_mode = args.iter().any(|arg| arg == "--stdout");

    if args.iter().any(|arg| arg == "--init-config") {
        return Config::default().save_to_path(&config_path);
    }

    let config = Config::load_from_path(&config_path);
    let registry = Arc::new(
        SpotRegistry::new(config.spots.clone()).context("invalid spot list in configuration")?,
    );

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    if report_mode {
        rt.block_on(run_report(config, registry))
    } else {
        rt.block_on(server::serve(config, registry))
    }
}
