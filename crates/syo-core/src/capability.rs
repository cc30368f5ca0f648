//! # Capability Lists
//!
//! A capability list is the set of principals granted one access level on
//! one facet. Membership is unordered, but the list keeps insertion order so
//! a saved sidecar round-trips byte for byte.
//!
//! The sentinels `"public"` and `"*"` both mean "every principal".

use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel principal meaning everyone.
pub const PUBLIC: &str = "public";

/// Wildcard accepted as a synonym for [`PUBLIC`].
pub const WILDCARD: &str = "*";

/// Insertion-ordered set of principal identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilityList(Vec<String>);

impl CapabilityList {
    /// An empty list (nobody).
    pub fn new() -> Self {
        Self::default()
    }

    /// A list containing only the public sentinel.
    pub fn public() -> Self {
        Self(vec![PUBLIC.to_string()])
    }

    /// A list containing a single principal.
    pub fn only(principal: impl Into<String>) -> Self {
        Self(vec![principal.into()])
    }

    /// Whether the list grants everyone.
    pub fn is_public(&self) -> bool {
        self.0.iter().any(|p| is_public_sentinel(p))
    }

    /// Whether `principal` is granted, directly or through the public sentinel.
    pub fn allows(&self, principal: &str) -> bool {
        self.is_public() || self.contains(principal)
    }

    /// Whether `principal` is an explicit member.
    pub fn contains(&self, principal: &str) -> bool {
        self.0.iter().any(|p| p == principal)
    }

    /// Add a principal. Returns `false` if it was already present.
    pub fn insert(&mut self, principal: impl Into<String>) -> bool {
        let principal = principal.into();
        if self.contains(&principal) {
            return false;
        }
        self.0.push(principal);
        true
    }

    /// Remove a principal. Returns `false` if it was absent.
    pub fn remove(&mut self, principal: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p != principal);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilityList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for principal in iter {
            list.insert(principal);
        }
        list
    }
}

impl From<Vec<String>> for CapabilityList {
    fn from(principals: Vec<String>) -> Self {
        principals.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for CapabilityList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(raw.unwrap_or_default().into())
    }
}

fn is_public_sentinel(principal: &str) -> bool {
    principal == PUBLIC || principal == WILDCARD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_sentinels() {
        assert!(CapabilityList::public().allows("anyone@example.com"));
        assert!(CapabilityList::only("*").is_public());
        assert!(!CapabilityList::only("alice@example.com").is_public());
    }

    #[test]
    fn test_allows_explicit_member() {
        let list = CapabilityList::only("alice@example.com");
        assert!(list.allows("alice@example.com"));
        assert!(!list.allows("bob@example.com"));
    }

    #[test]
    fn test_insert_deduplicates_and_keeps_order() {
        let mut list = CapabilityList::new();
        assert!(list.insert("b"));
        assert!(list.insert("a"));
        assert!(!list.insert("b"));
        assert_eq!(list.as_slice(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_remove() {
        let mut list: CapabilityList = ["a", "b"].into_iter().collect();
        assert!(list.remove("a"));
        assert!(!list.remove("a"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_deserialize_null_as_empty() {
        let list: CapabilityList = serde_yaml::from_str("~").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let list: CapabilityList = serde_yaml::from_str("[a, b, a]").unwrap();
        assert_eq!(list.to_vec(), vec!["a".to_string(), "b".to_string()]);
    }
}
