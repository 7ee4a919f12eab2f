//! Error types for the content service.
//!
//! Uses `thiserror` for typed errors that surface through the gateway,
//! where they are rendered into the human-readable strings clients see.

use marquee_types::MovieId;

/// Errors that can occur while talking to a content backend.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The backend rejected the supplied credentials or returned no token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// No movie exists with the requested identifier.
    #[error("no movie with id {0}")]
    MovieNotFound(MovieId),

    /// A backend response could not be decoded.
    #[error("malformed backend response: {0}")]
    Decode(String),

    /// The in-memory catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Reading a catalog file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    /// Whether this error means the requested record does not exist,
    /// as opposed to the backend being unavailable or misbehaving.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::MovieNotFound(_))
    }
}
