//! Storefront - entry point
//!
//! Configuration comes from the file named by `STOREFRONT_CONFIG`
//! (default `storefront.toml`, skipped when absent), a `.env` file and
//! `STOREFRONT__SECTION__KEY` variables. The server runs until SIGINT or
//! SIGTERM and then drains in-flight requests.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use storefront::app::{log_config, App};
use storefront::InMemoryRepository;
use storefront_config::ConfigLoader;
use storefront_server::{DrainOutcome, ShutdownSignal};
use storefront_telemetry::{init_logging, MetricsRegistry};

const CONFIG_VAR: &str = "STOREFRONT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "storefront.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var_os(CONFIG_VAR)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file(&path)?
        .with_env_prefix("STOREFRONT")
        .load()
        .with_context(|| format!("invalid configuration (file: {})", path.display()))?;

    let log_guard = init_logging(&log_config(&config.telemetry))?;

    info!(
        service = %config.telemetry.service_name,
        version = storefront::VERSION,
        environment = %config.telemetry.environment,
        "starting storefront"
    );

    let repository = InMemoryRepository::from_settings(&config.store)
        .context("failed to prepare product store")?;

    let mut app = App::new(config.clone(), Arc::new(repository));
    if config.telemetry.metrics.enabled {
        app = app.with_metrics(MetricsRegistry::install()?);
    }

    let listening = match app.into_server().listen().await {
        Ok(listening) => listening,
        Err(e) => {
            error!(error = %e, "failed to start server");
            drop(log_guard);
            std::process::exit(1);
        }
    };

    let shutdown = ShutdownSignal::with_os_signals().context("failed to install signal handlers")?;
    let report = listening.serve(shutdown).await;

    match report.outcome {
        DrainOutcome::Completed => info!(
            drain = ?report.drain_elapsed,
            "server stopped"
        ),
        DrainOutcome::Forced { remaining } => warn!(
            drain = ?report.drain_elapsed,
            remaining,
            "server forced to stop before connections drained"
        ),
    }

    Ok(())
}
