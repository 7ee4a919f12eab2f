//! Error types for the gateway endpoints.
//!
//! [`GatewayError`] unifies all failure modes of the HTTP endpoints into
//! a single enum that converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Clients
//! only ever see the human-readable message as a plain-text body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marquee_content::ContentError;

/// Errors that can occur in the gateway endpoint layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The `session` parameter is missing or names no registered session.
    #[error("Invalid session ID")]
    InvalidSession,

    /// The genre endpoint was called without a movie identifier.
    #[error("No movieID given")]
    MissingMovieId,

    /// The movie identifier is not an integer.
    #[error("Invalid movieID")]
    InvalidMovieId,

    /// The registration query string could not be decoded.
    #[error("Invalid registration parameters: {0}")]
    InvalidRegistration(String),

    /// The content backend for a new session could not be constructed.
    #[error("Couldn't register session! Error: {0}")]
    Registration(#[source] ContentError),

    /// The movie or genre lookup failed.
    #[error("Couldn't grab genres! Error: {0}")]
    Genres(#[source] ContentError),

    /// Genre results could not be serialized.
    #[error("Couldn't serialize genres JSON! Error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// HTTP status paired with the error message.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::MissingMovieId | Self::InvalidMovieId | Self::InvalidRegistration(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Genres(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Registration(_) | Self::Genres(_) => StatusCode::BAD_GATEWAY,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
