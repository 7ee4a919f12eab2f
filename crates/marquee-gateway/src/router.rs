//! Axum router construction for the gateway.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /register` -- session registration (per-session mode only)
/// - `GET /genres/{movieID}` -- genre names for one movie
/// - `GET /movie` -- `WebSocket` incremental search
///
/// CORS is configured to allow any origin so browser clients on other
/// hosts can reach the search socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/movie", get(ws::ws_movie))
        // REST API
        .route("/genres", get(handlers::genres_missing_id))
        .route("/genres/", get(handlers::genres_missing_id))
        .route("/genres/{movie_id}", get(handlers::genres));

    if state.uses_sessions() {
        router = router.route("/register", get(handlers::register));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
