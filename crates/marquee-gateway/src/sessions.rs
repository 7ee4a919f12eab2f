//! Session registry mapping tokens to content handles.
//!
//! [`SessionRegistry`] is owned by [`AppState`](crate::state::AppState)
//! and passed to the handlers explicitly. Every read and write of the
//! token map happens inside one mutex, and the lock is only ever held for
//! the map operation itself: content handles are cloned out before any
//! backend call is made, so a slow backend never blocks other lookups.
//!
//! Entries are retained for the life of the process. There is no
//! eviction.

use std::collections::HashMap;

use marquee_content::MovieContent;
use marquee_types::SessionToken;
use tokio::sync::Mutex;
use tracing::info;

/// In-memory map from session token to content handle.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionToken, MovieContent>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under a freshly generated token and return the token.
    pub async fn register(&self, content: MovieContent) -> SessionToken {
        let token = SessionToken::generate();
        let backend = content.backend_name();
        let count = {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(token, content);
            sessions.len()
        };
        info!(session = %token, backend, sessions = count, "Session registered");
        token
    }

    /// Look up the content handle for `token`.
    pub async fn lookup(&self, token: &SessionToken) -> Option<MovieContent> {
        self.sessions.lock().await.get(token).cloned()
    }

    /// Parse a raw `session` parameter and look it up.
    ///
    /// Malformed tokens are reported the same way as unknown ones.
    pub async fn resolve(&self, raw: &str) -> Option<MovieContent> {
        let token: SessionToken = raw.parse().ok()?;
        self.lookup(&token).await
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no session has been registered yet.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
