//! Core type definitions for pulsestore.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a record's logical identity.
///
/// For records ingested through the current API this is deterministically
/// derived from the identity-significant fields (see [`crate::identifier`]),
/// so any caller can compute it independently. For records ingested through
/// the legacy path it is the legacy primary key rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_as_str() {
        let id = RecordId::new("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(format!("{id}"), "abc123");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = RecordId::new("aaa");
        let b = RecordId::new("bbb");
        assert!(a < b);
    }
}
