//! Gateway startup helpers for the composition root.
//!
//! [`build_state`] turns a validated [`GatewayConfig`] into the
//! [`AppState`] the handlers share, connecting the shared backend up
//! front when running in shared mode. [`spawn_gateway`] binds eagerly and
//! serves on a background Tokio task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use marquee_gateway::startup::{build_state, spawn_gateway};
//! use std::sync::Arc;
//!
//! let state = Arc::new(build_state(&config).await?);
//! let (addr, handle) = spawn_gateway(&config.server, state).await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use marquee_content::{Catalog, ContentConnector, ContentError, MovieContent};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ContentBackendKind, GatewayConfig, ServerConfig, SessionMode};
use crate::server::{ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur while assembling or launching the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The content backend could not be prepared.
    #[error("content backend error: {0}")]
    Content(#[from] ContentError),

    /// The configuration lacks something the selected mode needs.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Build the shared application state described by `config`.
///
/// # Errors
///
/// Returns [`StartupError::Content`] if the catalog cannot be loaded or
/// the shared Db2 connection cannot be established, and
/// [`StartupError::Config`] if a required section is missing.
pub async fn build_state(config: &GatewayConfig) -> Result<AppState, StartupError> {
    let catalog = match (config.content.backend, &config.content.catalog_path) {
        (ContentBackendKind::Catalog, Some(path)) => {
            let catalog = Catalog::from_json_file(path)?;
            info!(path = %path.display(), movies = catalog.len(), "Catalog loaded");
            Some(Arc::new(catalog))
        }
        (ContentBackendKind::Catalog, None) => {
            return Err(StartupError::Config(
                "content.backend `catalog` requires content.catalog_path".to_owned(),
            ));
        }
        (ContentBackendKind::Db2, _) => None,
    };

    let state = match config.sessions.mode {
        SessionMode::PerSession => {
            let connector = catalog.map_or(ContentConnector::Db2, ContentConnector::Catalog);
            AppState::with_sessions(connector)
        }
        SessionMode::Shared => {
            let content = if let Some(catalog) = catalog {
                MovieContent::catalog(catalog)
            } else {
                let settings = config.content.shared_db2.as_ref().ok_or_else(|| {
                    StartupError::Config(
                        "shared sessions over db2 require content.shared_db2".to_owned(),
                    )
                })?;
                ContentConnector::Db2.connect(settings).await?
            };
            AppState::shared(content)
        }
    };

    let state = state.with_page_size(config.content.search_page_size);
    info!(
        mode = ?config.sessions.mode,
        backend = ?config.content.backend,
        page_size = state.search_page_size,
        "Gateway state assembled"
    );
    Ok(state)
}

/// Bind the gateway listener and serve on a background Tokio task.
///
/// The bind happens before the task is spawned, so a busy port is
/// reported here rather than logged from the background. Returns the
/// bound address (useful with port `0`) and the task handle; the server
/// runs until the task is aborted or the runtime shuts down.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_gateway(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError> {
    let listener = bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state, std::future::pending()).await {
            tracing::error!(error = %e, "Gateway exited with error");
        }
    });

    info!(%addr, "Gateway spawned on background task");

    Ok((addr, handle))
}
