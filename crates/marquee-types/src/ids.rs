//! Session token wrapper around [`Uuid`].
//!
//! Tokens are random (UUID v4) so that one client cannot guess another
//! client's session from its own. They are opaque to clients: the only
//! thing a client does with a token is echo it back in the `session`
//! query parameter.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for one registered backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string that is not a well-formed session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTokenError(String);

impl core::fmt::Display for ParseTokenError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "malformed session token: {}", self.0)
    }
}

impl std::error::Error for ParseTokenError {}

impl FromStr for SessionToken {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ParseTokenError(e.to_string()))
    }
}
