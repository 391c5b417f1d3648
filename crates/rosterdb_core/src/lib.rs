//! # rosterdb Core
//!
//! Orchestration layer for rosterdb:
//!
//! - [`PlayerParser`] - the entity codec wiring [`rosterdb_model::Player`]
//!   to every backend-native format
//! - [`Registry`] - lazily-constructed, cached adapter instances
//! - [`SourceConfig`] - per-backend default descriptors from a JSON document
//! - [`Roster`] - the in-memory collection and its find/update/export
//!   operations, with validation enforced before any data is exposed
//! - [`reconcile`] - the diff-and-apply export algorithm
//!
//! The orchestrator owns everything explicitly: the region/server universe
//! is injected at construction and there is no global mutable state.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod reconcile;
mod registry;
mod roster;

pub use config::SourceConfig;
pub use error::{CoreError, CoreResult, Selection};
pub use parser::PlayerParser;
pub use reconcile::{reconcile, ReconcileReport};
pub use registry::Registry;
pub use roster::Roster;
