//! HTTP + `WebSocket` gateway for the Marquee movie service.
//!
//! This crate provides an Axum server that exposes a movie content
//! backend to remote clients:
//!
//! - **Session registration** (`GET /register`) -- clients hand over
//!   backend credentials and receive an opaque session token
//! - **Genre lookup** (`GET /genres/{movieID}`) -- genre names for one
//!   movie, as a JSON array
//! - **Search socket** (`GET /movie`, `WebSocket`) -- an incremental,
//!   paginated search session per connection
//!
//! # Architecture
//!
//! The [`SessionRegistry`] maps tokens to content handles behind a single
//! mutex that is never held across a backend call. Each search socket
//! owns a [`SearchBridge`], which decodes client messages, drives a
//! per-connection search worker, and relays non-empty result batches
//! back in order. A shared-backend mode skips registration entirely.
//!
//! [`SessionRegistry`]: sessions::SessionRegistry
//! [`SearchBridge`]: bridge::SearchBridge

pub mod bridge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sessions;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use bridge::{BridgeError, ResultsCallback, SearchBridge};
pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use sessions::SessionRegistry;
pub use startup::{StartupError, build_state, spawn_gateway};
pub use state::{AppState, Backend};
