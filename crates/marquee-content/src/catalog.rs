//! In-memory movie catalog backend.
//!
//! A [`Catalog`] answers the same lookups as the Db2 backend from a
//! fixed set of movies held in memory. It is loaded from a JSON file
//! (an array of movie objects, each with a `genres` list) and is used
//! for local runs without a database.

use std::collections::BTreeMap;
use std::path::Path;

use marquee_types::{Genre, Movie, MovieId};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// One movie plus the genres attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The movie record.
    #[serde(flatten)]
    pub movie: Movie,
    /// Genre names for the movie.
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// A fixed, in-memory set of movies keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<MovieId, CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries. Later entries replace earlier ones
    /// with the same movie identifier.
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.movie.id, entry))
                .collect(),
        }
    }

    /// Load a catalog from a JSON file containing an array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Io`] if the file cannot be read and
    /// [`ContentError::Catalog`] if it is not a valid entry array.
    pub fn from_json_file(path: &Path) -> Result<Self, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&contents).map_err(|e| {
            ContentError::Catalog(format!("invalid catalog {}: {e}", path.display()))
        })?;
        Ok(Self::new(entries))
    }

    /// Number of movies in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no movies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One page (0-based) of movies whose title contains `query`,
    /// case-insensitively, ordered by popularity (highest first) then id.
    pub fn search(&self, query: &str, page: u32, page_size: u32) -> Vec<Movie> {
        let needle = query.to_lowercase();
        let mut matches: Vec<&Movie> = self
            .entries
            .values()
            .map(|entry| &entry.movie)
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            let pa = a.popularity.unwrap_or(f64::NEG_INFINITY);
            let pb = b.popularity.unwrap_or(f64::NEG_INFINITY);
            pb.total_cmp(&pa).then(a.id.cmp(&b.id))
        });

        let size = usize::try_from(page_size).unwrap_or(usize::MAX);
        let skip = usize::try_from(page)
            .unwrap_or(usize::MAX)
            .saturating_mul(size);

        matches.into_iter().skip(skip).take(size).cloned().collect()
    }

    /// Look up a movie by identifier.
    pub fn movie(&self, id: MovieId) -> Result<Movie, ContentError> {
        self.entries
            .get(&id)
            .map(|entry| entry.movie.clone())
            .ok_or(ContentError::MovieNotFound(id))
    }

    /// Genre names attached to `movie`.
    pub fn genres(&self, movie: &Movie) -> Result<Vec<Genre>, ContentError> {
        self.entries
            .get(&movie.id)
            .map(|entry| entry.genres.clone())
            .ok_or(ContentError::MovieNotFound(movie.id))
    }
}
