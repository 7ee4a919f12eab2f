//! Movie content service for the Marquee gateway.
//!
//! This crate owns everything that talks to the movie database:
//!
//! - [`MovieContent`] -- a cheaply clonable handle over one content
//!   backend, answering search, movie, and genre lookups
//! - [`Db2Handler`] -- the Db2 REST backend, authenticated once at
//!   construction
//! - [`Catalog`] -- an in-memory backend loaded from a JSON file
//! - [`SearchService`] -- an incremental search session that tracks the
//!   current query and pagination cursor and publishes one result batch
//!   per request on a channel
//! - [`ContentConnector`] -- turns client-supplied [`AuthSettings`] into
//!   a new [`MovieContent`] handle at session registration
//!
//! [`AuthSettings`]: marquee_types::AuthSettings

pub mod catalog;
pub mod connector;
pub mod content;
pub mod db2;
pub mod error;
pub mod search;

pub use catalog::{Catalog, CatalogEntry};
pub use connector::ContentConnector;
pub use content::MovieContent;
pub use db2::Db2Handler;
pub use error::ContentError;
pub use search::{SearchService, SearchUpdate};
