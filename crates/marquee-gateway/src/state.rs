//! Shared application state for the gateway.
//!
//! [`AppState`] is built once by the composition root and injected into
//! every handler through Axum's `State` extractor. It decides where a
//! request's content handle comes from: the per-user [`SessionRegistry`]
//! or a single handle shared by every client.

use marquee_content::{ContentConnector, MovieContent};

use crate::error::GatewayError;
use crate::sessions::SessionRegistry;

/// Default number of movies per search result batch.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Where request handlers obtain their content handle.
#[derive(Debug)]
pub enum Backend {
    /// Clients register credentials and present a session token.
    Sessions {
        /// Registered sessions.
        registry: SessionRegistry,
        /// Builds the content handle for each new registration.
        connector: ContentConnector,
    },
    /// Every client shares one handle configured at startup.
    Shared(MovieContent),
}

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// Content handle source.
    pub backend: Backend,
    /// Number of movies per search result batch.
    pub search_page_size: u32,
}

impl AppState {
    /// State for per-session mode: clients call `/register` first.
    pub fn with_sessions(connector: ContentConnector) -> Self {
        Self {
            backend: Backend::Sessions {
                registry: SessionRegistry::new(),
                connector,
            },
            search_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// State for shared mode: no registration, `session` is ignored.
    pub const fn shared(content: MovieContent) -> Self {
        Self {
            backend: Backend::Shared(content),
            search_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the search page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.search_page_size = page_size.max(1);
        self
    }

    /// Whether clients must register before using the other endpoints.
    pub const fn uses_sessions(&self) -> bool {
        matches!(self.backend, Backend::Sessions { .. })
    }

    /// The session registry, when running in per-session mode.
    pub const fn registry(&self) -> Option<&SessionRegistry> {
        match &self.backend {
            Backend::Sessions { registry, .. } => Some(registry),
            Backend::Shared(_) => None,
        }
    }

    /// Resolve the content handle for a request.
    ///
    /// In shared mode the `session` parameter is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidSession`] in per-session mode when
    /// `session` is missing, malformed, or unknown.
    pub async fn resolve(&self, session: Option<&str>) -> Result<MovieContent, GatewayError> {
        match &self.backend {
            Backend::Shared(content) => Ok(content.clone()),
            Backend::Sessions { registry, .. } => {
                let raw = session.ok_or(GatewayError::InvalidSession)?;
                registry
                    .resolve(raw)
                    .await
                    .ok_or(GatewayError::InvalidSession)
            }
        }
    }
}
