//! # Object Identity
//!
//! Newtype wrapper for the stable identifier assigned to every object at
//! creation. The identifier is opaque: freshly created objects receive a
//! random UUID, but sidecars written by other producers may carry any
//! non-empty string and must still load.
//!
//! ## Invariant
//!
//! An `ObjectId` is never reassigned after creation. `Descriptor` exposes
//! no setter for it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an addressable object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first eight characters, used to make artifact filenames unique.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn test_short_prefix() {
        let id = ObjectId::from_string("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
    }

    #[test]
    fn test_short_on_short_id() {
        let id = ObjectId::from_string("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ObjectId::from_string("obj-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"obj-1\"");
    }
}
