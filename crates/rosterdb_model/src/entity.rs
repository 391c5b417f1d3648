//! Record identity, the persistable-record capability, and the operation tag.

use crate::error::InvariantViolation;
use crate::region::RegionLookup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The stable integer identity of a persisted record.
///
/// Keys are strictly positive for valid records; zero and negative values
/// only occur in records that have not passed validation yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityKey(pub i64);

impl EntityKey {
    /// Creates a new entity key.
    #[must_use]
    pub const fn new(key: i64) -> Self {
        Self(key)
    }

    /// Returns the raw key value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns true if the key is in the valid (strictly positive) range.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}

/// The ordered in-memory collection of records.
///
/// Keys are unique and iteration is ordered by key, so exports and diffs
/// are reproducible regardless of insertion order.
pub type EntityMap<E> = BTreeMap<EntityKey, E>;

/// A persistable domain record.
///
/// Any type exposing a stable identity and a validity check against the
/// reference-entity universe satisfies this capability; the persistence
/// layer requires nothing else of it.
pub trait VerifiedEntity: Clone {
    /// Returns the record's stable identity.
    fn key(&self) -> EntityKey;

    /// Checks the record against the loaded region/server universe.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant. An empty universe fails every
    /// record.
    fn verify(&self, lookup: &RegionLookup) -> Result<(), InvariantViolation>;
}

/// The operation tag shared by adapters, statement templates, and the
/// remote write protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataOperation {
    /// Insert a new record.
    Add,
    /// Overwrite an existing record by key.
    Modify,
    /// Remove a record by key.
    Delete,
    /// Fetch every record.
    Read,
    /// Fetch a single record by key.
    Search,
}

impl DataOperation {
    /// Returns true for the write-direction operations (add/modify/delete).
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Add | Self::Modify | Self::Delete)
    }
}

impl fmt::Display for DataOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Add => "ADD",
            Self::Modify => "MODIFY",
            Self::Delete => "DELETE",
            Self::Read => "READ",
            Self::Search => "SEARCH",
        };
        f.write_str(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validity() {
        assert!(EntityKey::new(1).is_valid());
        assert!(!EntityKey::new(0).is_valid());
        assert!(!EntityKey::new(-7).is_valid());
    }

    #[test]
    fn key_ordering() {
        let mut keys = vec![EntityKey::new(3), EntityKey::new(1), EntityKey::new(2)];
        keys.sort();
        assert_eq!(keys, vec![EntityKey::new(1), EntityKey::new(2), EntityKey::new(3)]);
    }

    #[test]
    fn operation_tags() {
        assert_eq!(DataOperation::Add.to_string(), "ADD");
        assert_eq!(DataOperation::Modify.to_string(), "MODIFY");
        assert_eq!(DataOperation::Delete.to_string(), "DELETE");
        assert!(DataOperation::Delete.is_write());
        assert!(!DataOperation::Read.is_write());
        assert!(!DataOperation::Search.is_write());
    }
}
