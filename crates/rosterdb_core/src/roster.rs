//! The data-access orchestrator: owns the in-memory collection and drives
//! find, update, flush, and export operations against the active source.

use crate::error::{CoreError, CoreResult};
use crate::parser::PlayerParser;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::registry::Registry;
use rosterdb_backend::{
    Backend, BackendError, BackendResult, Descriptor, ReadQuery, WritePayload,
};
use rosterdb_model::{
    DataOperation, EntityKey, EntityMap, InvariantViolation, Player, RegionLookup, VerifiedEntity,
};
use tracing::{debug, info, warn};

/// Prepares the adapter, runs the operation, and releases on every path.
fn with_adapter<T>(
    registry: &mut Registry<Player>,
    descriptor: &Descriptor,
    operate: impl FnOnce(&mut dyn Backend<Player>) -> BackendResult<T>,
) -> CoreResult<T> {
    let adapter = registry.adapter(descriptor.kind);
    let result = match adapter.prepare(descriptor) {
        Ok(()) => operate(adapter),
        Err(e) => Err(e),
    };
    adapter.release();
    result.map_err(Into::into)
}

/// The roster orchestrator.
///
/// Holds the region/server universe (injected once per session), the
/// adapter registry, the active connection descriptor, the ordered
/// in-memory collection, and a dirty flag for deferred file flushes.
/// Validation is enforced before any loaded or mutated data is exposed:
/// a collection that fails validation is cleared and its source detached.
pub struct Roster {
    lookup: RegionLookup,
    registry: Registry<Player>,
    parser: PlayerParser,
    descriptor: Option<Descriptor>,
    players: EntityMap<Player>,
    dirty: bool,
}

impl Roster {
    /// Creates an orchestrator over the given region/server universe.
    #[must_use]
    pub fn new(lookup: RegionLookup) -> Self {
        Self::with_registry(lookup, Registry::new())
    }

    /// Creates an orchestrator with a caller-built registry (e.g. one
    /// whose remote adapter is bound to an in-process transport).
    #[must_use]
    pub fn with_registry(lookup: RegionLookup, registry: Registry<Player>) -> Self {
        Self {
            lookup,
            registry,
            parser: PlayerParser,
            descriptor: None,
            players: EntityMap::new(),
            dirty: false,
        }
    }

    /// The loaded region/server universe.
    #[must_use]
    pub fn lookup(&self) -> &RegionLookup {
        &self.lookup
    }

    /// Selects the active source.
    pub fn attach(&mut self, descriptor: Descriptor) {
        debug!(source = %descriptor.kind, "source attached");
        self.descriptor = Some(descriptor);
    }

    /// The active source, if any.
    #[must_use]
    pub fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    /// The in-memory collection, ordered by key.
    #[must_use]
    pub fn players(&self) -> &EntityMap<Player> {
        &self.players
    }

    /// Returns a copy of one record.
    #[must_use]
    pub fn player(&self, key: EntityKey) -> Option<Player> {
        self.players.get(&key).cloned()
    }

    /// Returns true when the key is present in memory.
    #[must_use]
    pub fn contains(&self, key: EntityKey) -> bool {
        self.players.contains_key(&key)
    }

    /// Returns true when no records are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of records in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns true when a file source has unflushed changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the collection and the dirty flag.
    pub fn clear(&mut self) {
        self.players.clear();
        self.dirty = false;
    }

    fn active(&self) -> CoreResult<&Descriptor> {
        self.descriptor
            .as_ref()
            .ok_or_else(|| CoreError::configuration("no data source attached"))
    }

    fn verify_all(&self) -> Result<(), InvariantViolation> {
        for player in self.players.values() {
            player.verify(&self.lookup)?;
        }
        Ok(())
    }

    fn apply_in_memory(&mut self, operation: DataOperation, player: Player) {
        match operation {
            DataOperation::Add | DataOperation::Modify => {
                self.players.insert(player.key, player);
            }
            DataOperation::Delete => {
                self.players.remove(&player.key);
            }
            DataOperation::Read | DataOperation::Search => {}
        }
    }

    /// Replaces the collection with everything the active source holds.
    ///
    /// Fail-closed: on any adapter failure or validation failure the
    /// collection is reset to empty and the source detached, so callers
    /// never observe a data set that did not validate.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures and reports the first violated
    /// invariant as a data-corruption error.
    pub fn find_all(&mut self) -> CoreResult<&EntityMap<Player>> {
        self.players.clear();
        self.dirty = false;
        let descriptor = self.active()?.clone();
        debug!(source = %descriptor.kind, "loading collection");

        let parser = self.parser;
        let players = &mut self.players;
        let loaded = with_adapter(&mut self.registry, &descriptor, |adapter| {
            adapter.read(&parser, ReadQuery::All, players)
        });
        if let Err(e) = loaded {
            self.players.clear();
            self.descriptor = None;
            return Err(e);
        }
        if let Err(violation) = self.verify_all() {
            warn!(%violation, "loaded collection failed validation");
            self.players.clear();
            self.descriptor = None;
            return Err(violation.into());
        }
        if self.players.is_empty() {
            info!(source = %descriptor.kind, "source holds no records");
        } else {
            info!(count = self.players.len(), source = %descriptor.kind, "collection loaded");
        }
        Ok(&self.players)
    }

    /// Fetches a single record by key and replaces the collection with it.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the source has no such record, and a
    /// data-corruption error when the found record fails validation.
    pub fn find_by_key(&mut self, key: EntityKey) -> CoreResult<Player> {
        let descriptor = self.active()?.clone();
        let parser = self.parser;
        let mut found = EntityMap::new();
        with_adapter(&mut self.registry, &descriptor, |adapter| {
            adapter.read(&parser, ReadQuery::ByKey(key), &mut found)
        })?;
        let player = found.remove(&key).ok_or(CoreError::NotFound { key })?;
        player.verify(&self.lookup)?;
        self.players.clear();
        self.players.insert(key, player.clone());
        self.dirty = false;
        Ok(player)
    }

    /// Applies a single-record mutation.
    ///
    /// Add and Modify validate the record first. Live sources execute the
    /// backend write before the in-memory mutation, so the collection is
    /// unchanged if the adapter fails; file sources mutate memory
    /// immediately and defer the write to [`Roster::save`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for read-direction tags, a
    /// data-corruption error for invalid records, and adapter failures
    /// otherwise.
    pub fn update(&mut self, operation: DataOperation, player: Player) -> CoreResult<()> {
        if !operation.is_write() {
            return Err(CoreError::configuration(format!(
                "{operation} is not a mutation"
            )));
        }
        if matches!(operation, DataOperation::Add | DataOperation::Modify) {
            player.verify(&self.lookup)?;
        }
        let descriptor = self.active()?.clone();
        if descriptor.kind.is_file() {
            self.apply_in_memory(operation, player);
            self.dirty = true;
            return Ok(());
        }
        let parser = self.parser;
        with_adapter(&mut self.registry, &descriptor, |adapter| {
            adapter.update(&parser, operation, WritePayload::One(&player))
        })?;
        self.apply_in_memory(operation, player);
        Ok(())
    }

    /// Flushes deferred changes to the active file source.
    ///
    /// Live sources write through on [`Roster::update`], so this is a
    /// no-op for them and whenever nothing changed.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures; the dirty flag stays set so the flush
    /// can be retried.
    pub fn save(&mut self) -> CoreResult<()> {
        if !self.dirty {
            debug!("nothing to flush");
            return Ok(());
        }
        let descriptor = self.active()?.clone();
        if !descriptor.kind.is_file() {
            self.dirty = false;
            return Ok(());
        }
        let parser = self.parser;
        let players = &self.players;
        with_adapter(&mut self.registry, &descriptor, |adapter| {
            adapter.update(&parser, DataOperation::Modify, WritePayload::All(players))
        })?;
        self.dirty = false;
        info!(count = self.players.len(), "collection flushed");
        Ok(())
    }

    /// Writes the entire current collection to a fresh file, independent
    /// of the active source.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-file targets and propagates
    /// write failures.
    pub fn export_to_file(&mut self, target: &Descriptor) -> CoreResult<()> {
        if !target.kind.is_file() {
            return Err(CoreError::configuration(format!(
                "{} is not a file target",
                target.kind
            )));
        }
        std::fs::write(&target.url, b"")
            .map_err(|e| BackendError::write(format!("create {}: {e}", target.url)))?;
        let parser = self.parser;
        let players = &self.players;
        with_adapter(&mut self.registry, target, |adapter| {
            adapter.update(&parser, DataOperation::Modify, WritePayload::All(players))
        })?;
        info!(count = self.players.len(), target = %target.url, "collection exported");
        Ok(())
    }

    /// Reconciles a target backend to the current collection.
    ///
    /// # Errors
    ///
    /// Propagates the reconciliation failure; transactional targets are
    /// rolled back and left unchanged.
    pub fn export_to_backend(&mut self, target: &Descriptor) -> CoreResult<ReconcileReport> {
        let adapter = self.registry.adapter(target.kind);
        reconcile(&self.players, adapter, &self.parser, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterdb_backend::BackendKind;
    use rosterdb_model::{Region, Server};
    use tempfile::tempdir;

    fn universe() -> RegionLookup {
        RegionLookup::from_iter([
            (Region::new("EU"), Server::new("S1")),
            (Region::new("EU"), Server::new("S2")),
            (Region::new("NA"), Server::new("S3")),
        ])
    }

    fn player(key: i64, name: &str, region: &str, server: &str) -> Player {
        Player::new(key, name, Region::new(region), Server::new(server))
    }

    fn doc_descriptor(path: &std::path::Path) -> Descriptor {
        Descriptor::new(BackendKind::DocumentStore, path.to_string_lossy()).table("player")
    }

    #[test]
    fn live_source_roundtrip() {
        let dir = tempdir().unwrap();
        let descriptor = doc_descriptor(&dir.path().join("docs.db"));

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S1"))
            .unwrap();
        roster
            .update(DataOperation::Add, player(2, "Bob", "NA", "S3"))
            .unwrap();
        assert_eq!(roster.len(), 2);

        // A fresh load from the source sees both records.
        roster.clear();
        roster.find_all().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.player(EntityKey::new(1)).unwrap().name, "Alice");
        assert!(!roster.is_dirty());
    }

    #[test]
    fn no_source_attached() {
        let mut roster = Roster::new(universe());
        assert!(matches!(
            roster.find_all(),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn invalid_record_is_rejected_before_mutation() {
        let dir = tempdir().unwrap();
        let mut roster = Roster::new(universe());
        roster.attach(doc_descriptor(&dir.path().join("docs.db")));

        // S3 belongs to NA, not EU.
        let err = roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S3"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DataCorrupted(_)));
        assert!(roster.is_empty());
    }

    #[test]
    fn empty_universe_rejects_every_record() {
        let dir = tempdir().unwrap();
        let mut roster = Roster::new(RegionLookup::new());
        roster.attach(doc_descriptor(&dir.path().join("docs.db")));
        let err = roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S1"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DataCorrupted(InvariantViolation::EmptyUniverse)
        ));
    }

    #[test]
    fn find_all_fails_closed_on_corrupted_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.db");
        let descriptor = doc_descriptor(&path);

        // Seed the store directly with a record whose region is unknown,
        // bypassing the orchestrator's validation.
        {
            let mut backend = rosterdb_backend::DocumentBackend::new();
            let adapter: &mut dyn Backend<Player> = &mut backend;
            adapter.prepare(&descriptor).unwrap();
            adapter
                .update(
                    &PlayerParser,
                    DataOperation::Add,
                    WritePayload::One(&player(1, "Ghost", "XX", "S9")),
                )
                .unwrap();
            adapter.release();
        }

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        let err = roster.find_all().unwrap_err();
        assert!(matches!(err, CoreError::DataCorrupted(_)));
        assert!(roster.is_empty());
        assert!(roster.descriptor().is_none());
    }

    #[test]
    fn find_by_key_replaces_the_collection() {
        let dir = tempdir().unwrap();
        let descriptor = doc_descriptor(&dir.path().join("docs.db"));

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S1"))
            .unwrap();
        roster
            .update(DataOperation::Add, player(2, "Bob", "NA", "S3"))
            .unwrap();

        let found = roster.find_by_key(EntityKey::new(2)).unwrap();
        assert_eq!(found.name, "Bob");
        assert_eq!(roster.len(), 1);
        assert!(roster.contains(EntityKey::new(2)));
    }

    #[test]
    fn find_by_key_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let descriptor = doc_descriptor(&dir.path().join("docs.db"));

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        for key in [1, 2, 3] {
            roster
                .update(DataOperation::Add, player(key, "P", "EU", "S1"))
                .unwrap();
        }
        let err = roster.find_by_key(EntityKey::new(5)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn live_write_failure_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let descriptor = doc_descriptor(&dir.path().join("docs.db"));

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S1"))
            .unwrap();

        // A second ADD with the same key violates the store's key
        // constraint; the adapter call precedes the in-memory mutation.
        let err = roster
            .update(DataOperation::Add, player(1, "Clone", "EU", "S1"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::Write(_))));
        assert_eq!(roster.player(EntityKey::new(1)).unwrap().name, "Alice");
    }

    #[test]
    fn file_updates_defer_until_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.txt");
        std::fs::write(&path, b"").unwrap();
        let descriptor = Descriptor::new(BackendKind::FileText, path.to_string_lossy());

        let mut roster = Roster::new(universe());
        roster.attach(descriptor);
        roster
            .update(DataOperation::Add, player(1, "Alice", "EU", "S1"))
            .unwrap();
        assert!(roster.is_dirty());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        roster.save().unwrap();
        assert!(!roster.is_dirty());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        roster.find_all().unwrap();
        assert_eq!(roster.player(EntityKey::new(1)).unwrap().name, "Alice");
    }

    #[test]
    fn save_without_changes_is_a_noop() {
        let mut roster = Roster::new(universe());
        roster.save().unwrap();
    }

    #[test]
    fn update_rejects_read_tags() {
        let dir = tempdir().unwrap();
        let mut roster = Roster::new(universe());
        roster.attach(doc_descriptor(&dir.path().join("docs.db")));
        let err = roster
            .update(DataOperation::Read, player(1, "Alice", "EU", "S1"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn export_to_file_rejects_live_targets() {
        let dir = tempdir().unwrap();
        let mut roster = Roster::new(universe());
        let target = doc_descriptor(&dir.path().join("docs.db"));
        let err = roster.export_to_file(&target).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
