//! # rosterdb Testkit
//!
//! Test fixtures shared by the rosterdb crates:
//!
//! - a canned region/server universe and sample rosters
//! - seeded SQLite databases (player tables, reference tables)
//! - descriptor builders for disk-backed test sources
//! - [`JsonRosterService`] - an in-process implementation of the remote
//!   JSON protocol, usable as an `HttpClient` so the HTTP adapter can be
//!   exercised end-to-end without a network
//!
//! Fixture helpers panic on setup failure; they only run inside tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;
mod service;

pub use fixtures::{
    create_player_table, player, player_statements, sample_players, scratch_dir,
    seed_reference_db, sql_descriptor, universe,
};
pub use service::{JsonRosterService, ServiceHandle};
