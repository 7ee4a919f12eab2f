//! REST endpoint handlers for the gateway.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/register` | Register backend credentials, returns a session token |
//! | `GET` | `/genres/{movieID}` | Genre names for one movie |
//!
//! Every response body is plain text: a token, a JSON array, or a
//! human-readable error string.

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use marquee_content::MovieContent;
use marquee_types::{AuthSettings, MovieId};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::state::{AppState, Backend};

/// Query parameters carrying the session token.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SessionQuery {
    /// Token returned by `/register`.
    pub session: Option<String>,
}

/// Resolve the content handle named by the `session` query parameter.
///
/// A query string that does not decode (e.g. a repeated `session`) names
/// no session, which only matters in per-session mode.
pub(crate) async fn resolve_session(
    state: &AppState,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<MovieContent, GatewayError> {
    match query {
        Ok(Query(query)) => state.resolve(query.session.as_deref()).await,
        Err(e) if state.uses_sessions() => {
            debug!(error = %e.body_text(), "Undecodable session parameter");
            Err(GatewayError::InvalidSession)
        }
        Err(_) => state.resolve(None).await,
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// GET /register
// ---------------------------------------------------------------------------

/// Build a content handle from the supplied credentials and store it
/// under a fresh session token.
///
/// # Query Parameters
///
/// `hostname`, `database`, `dbPort`, `restPort`, `ssl`, `password`,
/// `username`, `expiryTime`.
pub async fn register(
    State(state): State<Arc<AppState>>,
    settings: Result<Query<AuthSettings>, QueryRejection>,
) -> Result<String, GatewayError> {
    let Query(settings) =
        settings.map_err(|e| GatewayError::InvalidRegistration(e.body_text()))?;

    let Backend::Sessions {
        registry,
        connector,
    } = &state.backend
    else {
        // Not routed in shared mode.
        return Err(GatewayError::InvalidRegistration(
            "sessions are disabled".to_owned(),
        ));
    };

    let content = connector.connect(&settings).await.map_err(|e| {
        warn!(hostname = %settings.hostname, error = %e, "Session registration failed");
        GatewayError::Registration(e)
    })?;

    let token = registry.register(content).await;
    Ok(token.to_string())
}

// ---------------------------------------------------------------------------
// GET /genres/{movieID}
// ---------------------------------------------------------------------------

/// Return the genre names of one movie as a JSON array.
///
/// The session is checked before the movie identifier, so a bad session
/// is reported even when the identifier is also bad.
pub async fn genres(
    State(state): State<Arc<AppState>>,
    movie_id: Result<Path<String>, PathRejection>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let content = resolve_session(&state, query).await?;
    let Path(movie_id) = movie_id.map_err(|e| {
        debug!(error = %e.body_text(), "Undecodable movieID");
        GatewayError::InvalidMovieId
    })?;
    lookup_genres(&content, Some(&movie_id)).await
}

/// `/genres` without a movie identifier.
pub async fn genres_missing_id(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let content = resolve_session(&state, query).await?;
    lookup_genres(&content, None).await
}

async fn lookup_genres(
    content: &MovieContent,
    movie_id: Option<&str>,
) -> Result<Response, GatewayError> {
    let raw = movie_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(GatewayError::MissingMovieId)?;
    let movie_id = raw
        .parse::<MovieId>()
        .ok()
        .ok_or(GatewayError::InvalidMovieId)?;

    let genres = content
        .genres_for_id(movie_id)
        .await
        .map_err(GatewayError::Genres)?;
    debug!(movie_id, count = genres.len(), "Genres resolved");

    let body = serde_json::to_string(&genres)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
