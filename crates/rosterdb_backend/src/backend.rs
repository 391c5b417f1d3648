//! The backend adapter contract.

use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_model::{DataOperation, EntityKey, EntityMap, VerifiedEntity};

/// What a read operation fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadQuery {
    /// Every record in the backend.
    All,
    /// The single record with the given key, if present.
    ByKey(EntityKey),
}

/// What a write operation carries.
///
/// Live backends take one record per call; file backends rewrite the whole
/// collection as one unit and only accept [`WritePayload::All`].
#[derive(Debug)]
pub enum WritePayload<'a, E> {
    /// A single record, for live single-record writes.
    One(&'a E),
    /// The entire collection, for whole-file flushes and exports.
    All(&'a EntityMap<E>),
}

impl<'a, E> WritePayload<'a, E> {
    /// Returns the single record, or an unsupported-operation error for
    /// adapters that only write one record at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is the whole collection.
    pub fn expect_one(&self) -> BackendResult<&'a E> {
        match self {
            Self::One(entity) => Ok(entity),
            Self::All(_) => Err(BackendError::unsupported(
                "this backend writes single records, not whole collections",
            )),
        }
    }

    /// Returns the whole collection, or an unsupported-operation error for
    /// file adapters that cannot write single records.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is a single record.
    pub fn expect_all(&self) -> BackendResult<&'a EntityMap<E>> {
        match self {
            Self::All(map) => Ok(map),
            Self::One(_) => Err(BackendError::unsupported(
                "file backends rewrite the whole collection, not single records",
            )),
        }
    }
}

/// A storage backend adapter.
///
/// Every storage technology implements the same four operations against
/// its own native data model, plus optional transaction hooks.
///
/// # Invariants
///
/// - `prepare` acquires the backend's resource (connection, file handle,
///   client) and validates it is usable; nothing else touches I/O before it.
/// - `release` is idempotent and must be called on every exit path,
///   including after a codec or I/O error.
/// - `read` streams native units through the codec into the map, one unit
///   per record; it does not report an empty result as an error and does
///   not signal not-found for a missed key search.
/// - `update` wraps every failure into a [`BackendError`] and, for
///   transactional backends, rolls the operation back before propagating.
/// - While a batch opened by `begin` is active, per-update commits are
///   suppressed until `commit`; `rollback` discards the batch. The default
///   hooks are no-ops for non-transactional backends.
pub trait Backend<E: VerifiedEntity> {
    /// Opens the backend described by the descriptor.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the backend is unreachable and a
    /// configuration error if the descriptor is unusable for this adapter.
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()>;

    /// Closes the backend and frees its resource. Idempotent.
    fn release(&mut self);

    /// Reads records into the map through the codec.
    ///
    /// # Errors
    ///
    /// Returns a read error for I/O or protocol failures, a corrupted-data
    /// error for undecodable native units, and an unsupported-operation
    /// error for key searches on file backends.
    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()>;

    /// Executes a write operation with the codec-serialized payload.
    ///
    /// # Errors
    ///
    /// Returns a write error for I/O or protocol failures, a configuration
    /// error for read-direction tags, and an unsupported-operation error
    /// for payload shapes the backend cannot take.
    fn update(
        &mut self,
        codec: &dyn EntityCodec<E>,
        operation: DataOperation,
        payload: WritePayload<'_, E>,
    ) -> BackendResult<()>;

    /// Opens a batch so several updates commit together.
    ///
    /// # Errors
    ///
    /// Returns a write error if a batch cannot be opened.
    fn begin(&mut self) -> BackendResult<()> {
        Ok(())
    }

    /// Commits the open batch.
    ///
    /// # Errors
    ///
    /// Returns a write error if the commit fails.
    fn commit(&mut self) -> BackendResult<()> {
        Ok(())
    }

    /// Discards the open batch.
    ///
    /// # Errors
    ///
    /// Returns a write error if the rollback fails.
    fn rollback(&mut self) -> BackendResult<()> {
        Ok(())
    }
}

/// Rejects read-direction tags on the write path.
pub(crate) fn require_write_operation(operation: DataOperation) -> BackendResult<()> {
    if operation.is_write() {
        Ok(())
    } else {
        Err(BackendError::configuration(format!(
            "{operation} is not a write operation"
        )))
    }
}
