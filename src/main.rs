//! integration-guard
//!
//! Serves the health and admin surface of the resilience layer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Integration code                       Downstream APIs
//!     ────────────────                       ───────────────
//!     guard.call(op) ──▶ circuit_breaker ──▶ policy retries ──▶ ticketing / task-management
//!                           │                                    chat / ai
//!                           ▼
//!                        registry ──▶ /health, /health/circuit-breakers
//!                           ▲
//!                        /admin/circuit-breakers/{service}/open|close
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use integration_guard::config::{load_config, GuardConfig};
use integration_guard::http::HttpServer;
use integration_guard::lifecycle::{bootstrap, shutdown_signal};
use integration_guard::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "integration-guard", version)]
#[command(about = "Health and admin surface for integration circuit breakers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "integration-guard starting");

    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        breaker_overrides = config.breakers.len(),
        retry_overrides = config.retries.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let runtime = bootstrap(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, runtime.registry.clone());
    server.run(listener, shutdown_signal()).await?;

    runtime.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}
