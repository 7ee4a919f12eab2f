//! Shared type definitions for the Marquee movie gateway.
//!
//! This crate is the single source of truth for the records that cross
//! crate boundaries: the movie records produced by the content service,
//! the messages clients send over the search socket, and the opaque
//! session tokens handed out at registration.
//!
//! # Modules
//!
//! - [`ids`] -- Session token wrapper around a random UUID
//! - [`movie`] -- Movie and genre records returned by the content service
//! - [`requests`] -- Client payloads (search socket messages, registration settings)

pub mod ids;
pub mod movie;
pub mod requests;

// Re-export all public types at crate root for convenience.
pub use ids::{ParseTokenError, SessionToken};
pub use movie::{Genre, Movie, MovieId};
pub use requests::{AuthSettings, SearchRequest};
