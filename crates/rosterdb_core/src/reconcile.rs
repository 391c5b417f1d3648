//! Diff-and-apply export: make a backend's stored collection match the
//! desired in-memory collection.
//!
//! The algorithm reads the target's entire current collection through the
//! normal read path, then applies a three-way set difference keyed by
//! record identity: delete keys absent from the desired state, modify keys
//! present in both (full-record overwrite, no field-level diffing), add
//! keys only the desired state has. Deletes run first so unique-key
//! backends never observe a transient collision. All phases run inside one
//! batch, committed at the end; any failure rolls the whole export back.
//!
//! Re-reading the full target per export is O(existing size); acceptable
//! for roster-sized collections.

use crate::error::CoreResult;
use rosterdb_backend::{Backend, Descriptor, EntityCodec, ReadQuery, WritePayload};
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use tracing::info;

/// What a reconciliation run applied to the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records inserted because only the desired state had them.
    pub added: usize,
    /// Records overwritten because both sides had the key.
    pub modified: usize,
    /// Records removed because only the target had them.
    pub deleted: usize,
}

impl ReconcileReport {
    /// Returns true when the run created or removed nothing (a second run
    /// over an unchanged desired state reports this).
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.added == 0 && self.deleted == 0
    }
}

/// Reconciles the target backend to the desired collection.
///
/// The target adapter is prepared, fully driven, and released before
/// control returns, on every path.
///
/// # Errors
///
/// Propagates the first backend failure after rolling the batch back; the
/// target is unchanged in that case for transactional backends.
pub fn reconcile<E: VerifiedEntity>(
    desired: &EntityMap<E>,
    adapter: &mut dyn Backend<E>,
    codec: &dyn EntityCodec<E>,
    target: &Descriptor,
) -> CoreResult<ReconcileReport> {
    if let Err(e) = adapter.prepare(target) {
        adapter.release();
        return Err(e.into());
    }
    let outcome = apply_diff(desired, adapter, codec);
    adapter.release();
    let report = outcome?;
    info!(
        added = report.added,
        modified = report.modified,
        deleted = report.deleted,
        target = %target.kind,
        "reconciliation applied"
    );
    Ok(report)
}

fn apply_diff<E: VerifiedEntity>(
    desired: &EntityMap<E>,
    adapter: &mut dyn Backend<E>,
    codec: &dyn EntityCodec<E>,
) -> CoreResult<ReconcileReport> {
    let mut current = EntityMap::new();
    adapter.read(codec, ReadQuery::All, &mut current)?;

    adapter.begin()?;
    let phases = (|| {
        let mut report = ReconcileReport::default();
        // Phase 1: delete what the desired state no longer has.
        for (key, entity) in &current {
            if !desired.contains_key(key) {
                adapter.update(codec, DataOperation::Delete, WritePayload::One(entity))?;
                report.deleted += 1;
            }
        }
        // Phase 2: overwrite survivors, insert newcomers.
        for (key, entity) in desired {
            if current.contains_key(key) {
                adapter.update(codec, DataOperation::Modify, WritePayload::One(entity))?;
                report.modified += 1;
            } else {
                adapter.update(codec, DataOperation::Add, WritePayload::One(entity))?;
                report.added += 1;
            }
        }
        Ok(report)
    })();
    match phases {
        Ok(report) => {
            adapter.commit()?;
            Ok(report)
        }
        Err(e) => {
            let _ = adapter.rollback();
            Err(e)
        }
    }
}
