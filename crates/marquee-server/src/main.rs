//! Gateway binary for the Marquee movie service.
//!
//! This is the composition root: it loads configuration, installs the
//! log subscriber, builds the shared application state (the session
//! registry, or a single shared content handle), and serves the HTTP +
//! `WebSocket` endpoints until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `marquee-config.yaml` (or `MARQUEE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build application state from the content and session settings
//! 4. Serve until a shutdown signal arrives

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use marquee_gateway::config::{GatewayConfig, LoggingConfig};
use marquee_gateway::{build_state, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "marquee-config.yaml";

/// Application entry point for the gateway.
///
/// # Errors
///
/// Returns an error if configuration, startup, or serving fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration (logging settings live in it).
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(config = %config_source, "marquee-server starting");
    info!(
        host = config.server.host,
        port = config.server.port,
        mode = ?config.sessions.mode,
        backend = ?config.content.backend,
        "Configuration loaded"
    );

    // 3. Build application state.
    let state = Arc::new(build_state(&config).await.map_err(AppError::from)?);

    // 4. Serve until Ctrl-C.
    start_server(&config.server, state, shutdown_signal())
        .await
        .map_err(AppError::from)?;

    info!("marquee-server shutdown complete");
    Ok(())
}

/// Load the gateway configuration.
///
/// Reads `MARQUEE_CONFIG` if set, otherwise `marquee-config.yaml` in the
/// working directory. A missing default file falls back to defaults; a
/// missing explicitly named file is an error.
fn load_config() -> Result<(GatewayConfig, String), AppError> {
    let explicit = std::env::var("MARQUEE_CONFIG").ok().map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if explicit.is_some() || path.exists() {
        let config = GatewayConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let config = GatewayConfig::parse("{}")?;
        Ok((config, String::from("defaults")))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| AppError::Logging {
        message: format!("{e}"),
    })
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
