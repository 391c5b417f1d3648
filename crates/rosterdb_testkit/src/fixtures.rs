//! Canned universes, rosters, and seeded databases.

use rosterdb_backend::{BackendKind, Descriptor, SqlDialect, StatementSet};
use rosterdb_model::{EntityMap, Player, Region, RegionLookup, Server};
use std::path::Path;
use tempfile::TempDir;

/// The canned region/server universe: EU holds S1 and S2, NA holds S3.
#[must_use]
pub fn universe() -> RegionLookup {
    RegionLookup::from_iter([
        (Region::new("EU"), Server::new("S1")),
        (Region::new("EU"), Server::new("S2")),
        (Region::new("NA"), Server::new("S3")),
    ])
}

/// Shorthand record constructor.
#[must_use]
pub fn player(key: i64, name: &str, region: &str, server: &str) -> Player {
    Player::new(key, name, Region::new(region), Server::new(server))
}

/// Three valid records spanning both regions.
#[must_use]
pub fn sample_players() -> EntityMap<Player> {
    [
        player(1, "Alice", "EU", "S1"),
        player(2, "Bob", "NA", "S3"),
        player(3, "Cara", "EU", "S2"),
    ]
    .into_iter()
    .map(|p| (p.key, p))
    .collect()
}

/// A scratch directory that lives as long as the returned guard.
#[must_use]
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("create scratch dir")
}

/// Statement templates matching [`create_player_table`]'s schema.
#[must_use]
pub fn player_statements(table: &str) -> StatementSet {
    StatementSet {
        read_all: format!("SELECT id, region, server, name FROM {table} ORDER BY id"),
        search: format!("SELECT id, region, server, name FROM {table} WHERE id = ?1"),
        add: format!("INSERT INTO {table} (id, region, server, name) VALUES (?1, ?2, ?3, ?4)"),
        modify: format!("UPDATE {table} SET region = ?1, server = ?2, name = ?3 WHERE id = ?4"),
        delete: format!("DELETE FROM {table} WHERE id = ?1"),
    }
}

/// Creates the player table in a SQLite database.
pub fn create_player_table(path: &Path, table: &str) {
    let connection = rusqlite::Connection::open(path).expect("open sqlite database");
    connection
        .execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 id INTEGER PRIMARY KEY,
                 region TEXT NOT NULL,
                 server TEXT NOT NULL,
                 name TEXT NOT NULL
             )"
        ))
        .expect("create player table");
}

/// A template-driven SQL descriptor over a seeded player table.
#[must_use]
pub fn sql_descriptor(path: &Path, table: &str) -> Descriptor {
    Descriptor::new(BackendKind::RelationalSql, path.to_string_lossy())
        .dialect(SqlDialect::Sqlite)
        .table(table)
        .statements(player_statements(table))
}

/// Seeds the relational reference tables to match [`universe`].
pub fn seed_reference_db(path: &Path) {
    let connection = rusqlite::Connection::open(path).expect("open sqlite database");
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS region (name_region TEXT PRIMARY KEY);
             CREATE TABLE IF NOT EXISTS server (
                 name_server TEXT PRIMARY KEY,
                 region TEXT NOT NULL REFERENCES region(name_region)
             );
             INSERT OR IGNORE INTO region VALUES ('EU'), ('NA');
             INSERT OR IGNORE INTO server VALUES
                 ('S1', 'EU'), ('S2', 'EU'), ('S3', 'NA');",
        )
        .expect("seed reference tables");
}
