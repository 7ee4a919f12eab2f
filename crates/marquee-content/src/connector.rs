//! Construction of per-session content handles.
//!
//! When a client registers, the gateway hands its [`AuthSettings`] to a
//! [`ContentConnector`], which builds the [`MovieContent`] handle that
//! the new session will own. A failed connection means nothing gets
//! registered.

use std::sync::Arc;

use marquee_types::AuthSettings;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::content::MovieContent;
use crate::db2::Db2Handler;
use crate::error::ContentError;

/// Strategy for turning registration settings into a content handle.
#[derive(Debug, Clone)]
pub enum ContentConnector {
    /// Authenticate against the Db2 REST service named in the settings.
    Db2,
    /// Serve every session from one in-memory catalog. The settings are
    /// accepted as-is; there is no database to authenticate against.
    Catalog(Arc<Catalog>),
}

impl ContentConnector {
    /// Build a content handle for a new session.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ContentError`] if the connection cannot be
    /// established (unreachable host, rejected credentials).
    pub async fn connect(&self, settings: &AuthSettings) -> Result<MovieContent, ContentError> {
        match self {
            Self::Db2 => {
                let handler = Db2Handler::connect(settings).await?;
                info!(
                    hostname = %settings.hostname,
                    database = %settings.database,
                    ssl = settings.ssl,
                    "Db2 content handle created"
                );
                Ok(MovieContent::db2(handler))
            }
            Self::Catalog(catalog) => {
                debug!(username = %settings.username, "Catalog content handle created");
                Ok(MovieContent::catalog(Arc::clone(catalog)))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings(rest_port: u16) -> AuthSettings {
        AuthSettings {
            hostname: String::from("127.0.0.1"),
            database: String::from("movies"),
            db_port: 50000,
            rest_port,
            ssl: false,
            password: String::from("pw"),
            username: String::from("user"),
            expiry_time: String::from("1h"),
        }
    }

    #[tokio::test]
    async fn catalog_connector_yields_distinct_handles() {
        let connector = ContentConnector::Catalog(Arc::new(Catalog::default()));
        let a = connector.connect(&settings(1)).await.unwrap();
        let b = connector.connect(&settings(1)).await.unwrap();
        assert_eq!(a.backend_name(), "catalog");
        assert!(!a.same_backend(&b));
    }

    #[tokio::test]
    async fn db2_connector_fails_when_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = ContentConnector::Db2.connect(&settings(port)).await.unwrap_err();
        assert!(matches!(err, ContentError::Transport(_) | ContentError::Auth(_)));
    }
}
