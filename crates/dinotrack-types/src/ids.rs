//! Type-safe player identifier.
//!
//! Game servers identify players by a platform account string (a Steam ID
//! or an EOS ID depending on the server build). The identifier is the only
//! key of the roster; display names are informational and may collide.

use serde::{Deserialize, Serialize};

/// Stable identifier of a connected player.
///
/// Ordered so that the roster iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create an identifier, trimming surrounding whitespace and the
    /// trailing commas some server responses append.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().trim_end_matches(',').trim().to_owned())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return whether the identifier is empty after trimming.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PlayerId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
