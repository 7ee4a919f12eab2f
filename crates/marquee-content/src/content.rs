//! The content service handle.
//!
//! [`MovieContent`] is what the rest of the workspace holds on to: a
//! clonable handle over one backend. Uses enum dispatch instead of
//! trait objects because async methods are not dyn-compatible.

use std::sync::Arc;

use marquee_types::{Genre, Movie, MovieId};

use crate::catalog::Catalog;
use crate::db2::Db2Handler;
use crate::error::ContentError;

/// A content backend that can answer search, movie, and genre lookups.
#[derive(Debug)]
enum ContentBackend {
    /// Db2 REST service.
    Db2(Db2Handler),
    /// In-memory catalog, shared between handles built from it.
    Catalog(Arc<Catalog>),
}

/// Cheaply clonable handle to a content backend.
///
/// Clones share the same underlying backend (and, for Db2, the same
/// authenticated REST session).
#[derive(Debug, Clone)]
pub struct MovieContent {
    backend: Arc<ContentBackend>,
}

impl MovieContent {
    /// Wrap an authenticated Db2 handler.
    pub fn db2(handler: Db2Handler) -> Self {
        Self {
            backend: Arc::new(ContentBackend::Db2(handler)),
        }
    }

    /// Wrap an in-memory catalog.
    ///
    /// Each call yields a distinct handle even when the catalog data
    /// itself is shared.
    pub fn catalog(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            backend: Arc::new(ContentBackend::Catalog(catalog.into())),
        }
    }

    /// Human-readable backend name for logging.
    pub fn backend_name(&self) -> &'static str {
        match self.backend.as_ref() {
            ContentBackend::Db2(_) => "db2",
            ContentBackend::Catalog(_) => "catalog",
        }
    }

    /// Whether two handles share the same backend instance.
    pub fn same_backend(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    /// Fetch one page (0-based) of movies matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentError`] if the backend call fails.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Movie>, ContentError> {
        match self.backend.as_ref() {
            ContentBackend::Db2(db2) => db2.search(query, page, page_size).await,
            ContentBackend::Catalog(catalog) => Ok(catalog.search(query, page, page_size)),
        }
    }

    /// Look up a movie by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MovieNotFound`] if no such movie exists,
    /// or another [`ContentError`] if the backend call fails.
    pub async fn movie(&self, id: MovieId) -> Result<Movie, ContentError> {
        match self.backend.as_ref() {
            ContentBackend::Db2(db2) => db2.movie(id).await,
            ContentBackend::Catalog(catalog) => catalog.movie(id),
        }
    }

    /// Genre names attached to `movie`.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentError`] if the backend call fails.
    pub async fn genres(&self, movie: &Movie) -> Result<Vec<Genre>, ContentError> {
        match self.backend.as_ref() {
            ContentBackend::Db2(db2) => db2.genres(movie).await,
            ContentBackend::Catalog(catalog) => catalog.genres(movie),
        }
    }

    /// Resolve a movie identifier straight to its genre list.
    ///
    /// # Errors
    ///
    /// Propagates the first failure from [`Self::movie`] or [`Self::genres`].
    pub async fn genres_for_id(&self, id: MovieId) -> Result<Vec<Genre>, ContentError> {
        let movie = self.movie(id).await?;
        self.genres(&movie).await
    }
}
