//! Movie and genre records returned by the content service.
//!
//! Both records are serialized as-is onto the wire: a search result
//! batch is a JSON array of [`Movie`] objects and a genre lookup is a
//! JSON array of bare genre names.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a movie in the content database.
pub type MovieId = i64;

/// A single movie record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Database identifier.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Year of first release, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Short plot summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Relative popularity score used to rank search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

impl Movie {
    /// Create a movie with only the required fields set.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            release_year: None,
            overview: None,
            popularity: None,
        }
    }
}

/// A genre name such as `"Science Fiction"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genre(pub String);

impl From<&str> for Genre {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl core::fmt::Display for Genre {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
