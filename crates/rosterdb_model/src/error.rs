//! Validation invariants a record can violate.

use thiserror::Error;

/// A structural or referential invariant violated by a record.
///
/// Validation stops at the first violation; the variants name the failed
/// invariant so callers can surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The region/server universe is empty; no record can validate.
    #[error("region universe is empty; no record can be accepted")]
    EmptyUniverse,

    /// The record references a region absent from the universe.
    #[error("region {region:?} is not a known region")]
    UnknownRegion {
        /// The unknown region name.
        region: String,
    },

    /// The record references a server not listed under its region.
    #[error("server {server:?} is not listed under region {region:?}")]
    ServerNotInRegion {
        /// The server name.
        server: String,
        /// The region the record claims the server belongs to.
        region: String,
    },

    /// The record's key is zero or negative.
    #[error("entity key {key} is not a positive integer")]
    InvalidKey {
        /// The offending key value.
        key: i64,
    },

    /// The record's name field is blank.
    #[error("record {key} has a blank name")]
    BlankName {
        /// The key of the offending record.
        key: i64,
    },
}
