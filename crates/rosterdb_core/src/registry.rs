//! Lazily-constructed, cached adapter instances.

use rosterdb_backend::{new_backend, Backend, BackendKind};
use rosterdb_model::VerifiedEntity;
use std::collections::HashMap;

/// One adapter instance per backend kind, constructed on first use.
///
/// The registry lives as long as its owner (the orchestrator); individual
/// adapters open and close their resources per operation via
/// `prepare`/`release`, the registry itself is never torn down between
/// operations. Adapters for kinds that are never used are never built.
pub struct Registry<E: VerifiedEntity + 'static> {
    adapters: HashMap<BackendKind, Box<dyn Backend<E>>>,
}

impl<E: VerifiedEntity + 'static> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: VerifiedEntity + 'static> Registry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Returns the adapter for a kind, constructing and caching it on
    /// first use.
    pub fn adapter(&mut self, kind: BackendKind) -> &mut dyn Backend<E> {
        self.adapters
            .entry(kind)
            .or_insert_with(|| new_backend(kind))
            .as_mut()
    }

    /// Replaces the adapter for a kind, e.g. with one bound to an
    /// in-process transport.
    pub fn register(&mut self, kind: BackendKind, adapter: Box<dyn Backend<E>>) {
        self.adapters.insert(kind, adapter);
    }

    /// Returns how many adapters have been constructed so far.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.adapters.len()
    }
}
