//! The shipped record type.

use crate::entity::{EntityKey, VerifiedEntity};
use crate::error::InvariantViolation;
use crate::region::{Region, RegionLookup, Server};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A roster record: a player registered on one server of one region.
///
/// Map identity is by [`EntityKey`]; equality of the value itself covers
/// all fields, which is what export diffs and round-trip tests compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identity.
    pub key: EntityKey,
    /// Display name; must be non-blank to validate.
    pub name: String,
    /// The region the player is registered in.
    pub region: Region,
    /// The server inside that region.
    pub server: Server,
}

impl Player {
    /// Creates a record from its parts.
    pub fn new(
        key: impl Into<EntityKey>,
        name: impl Into<String>,
        region: impl Into<Region>,
        server: impl Into<Server>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            region: region.into(),
            server: server.into(),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "player {} ({}) on {}/{}",
            self.key, self.name, self.region, self.server
        )
    }
}

impl VerifiedEntity for Player {
    fn key(&self) -> EntityKey {
        self.key
    }

    fn verify(&self, lookup: &RegionLookup) -> Result<(), InvariantViolation> {
        if lookup.is_empty() {
            return Err(InvariantViolation::EmptyUniverse);
        }
        if !lookup.contains_region(&self.region) {
            return Err(InvariantViolation::UnknownRegion {
                region: self.region.name().to_string(),
            });
        }
        if !lookup.is_listed(&self.region, &self.server) {
            return Err(InvariantViolation::ServerNotInRegion {
                server: self.server.name().to_string(),
                region: self.region.name().to_string(),
            });
        }
        if !self.key.is_valid() {
            return Err(InvariantViolation::InvalidKey { key: self.key.get() });
        }
        if self.name.trim().is_empty() {
            return Err(InvariantViolation::BlankName { key: self.key.get() });
        }
        Ok(())
    }
}
