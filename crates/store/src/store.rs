// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` trait and its in-memory reference implementation.
//!
//! A real deployment would back this with a relational database exactly as
//! spec.md describes (token-guarded conditional updates, savepoints,
//! transactions) — that collaborator is out of scope here. `InMemoryStore`
//! models the same contract with a `parking_lot::Mutex`-guarded
//! materialized map, the persistence shape `oj-storage` already uses.

use crate::row::{Activity, ActivityRelationship, Appointment};
use crate::transit::{self, TransitOutcome, TransitPatch};
use chrono::Utc;
use modbpm_core::{ActivityId, ActivityState, BlobId, Clock, CompressedBlob, EngineError};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Durable storage contract every entry point in `modbpm-queue` is built
/// against (spec §3, §4.2).
pub trait Store: Send + Sync {
    /// Insert a fresh CREATED row (spec §3). `inputs` is the activity's
    /// already-persisted `(args, kwargs)` blob, if any — callers compress
    /// and `put_blob` it themselves before calling this (spec §3: "Nullable
    /// if no arguments").
    fn insert_activity(
        &self,
        name: &str,
        parent: Option<ActivityId>,
        inputs: Option<BlobId>,
    ) -> Result<Activity, EngineError>;

    fn get(&self, id: ActivityId) -> Result<Activity, EngineError>;

    /// `pk=? AND state=<state>` — the selector the four job-queue entry
    /// points use before acting (spec §4.6). Returns `Ok(None)` rather than
    /// an error: a selector miss is the expected no-op outcome of a stale
    /// job re-delivery, not a fault.
    fn get_if_state(&self, id: ActivityId, state: ActivityState) -> Result<Option<Activity>, EngineError>;

    /// Apply the `_transit` contract (spec §4.2 steps 1-6) to `id`. When the
    /// transition archives the row, any previous snapshot blob is deleted as
    /// an orphan and, if `patch.snapshot` replaces a still-live snapshot
    /// with a fresh one, the superseded blob is deleted too (spec §4.2 step
    /// 4: "at most one snapshot row per activity").
    fn transit(
        &self,
        id: ActivityId,
        to_state: ActivityState,
        patch: TransitPatch,
    ) -> Result<TransitOutcome, EngineError>;

    /// Apply `_appoint` to `id` and every non-archived descendant (spec
    /// §4.2: "this row and all non-archived descendants").
    fn appoint(&self, id: ActivityId, appointment: Appointment) -> Result<(), EngineError>;

    /// Non-archived descendants of `id`, nearest first. Used by `appoint`
    /// and exposed for runtime code that needs subtree visibility.
    fn descendants(&self, id: ActivityId) -> Result<Vec<ActivityId>, EngineError>;

    fn parent_of(&self, id: ActivityId) -> Result<Option<ActivityId>, EngineError>;

    /// Bump `acknowledgment` on a successful parent wake-up (spec §4.6
    /// `wake_up_parent_activity`: "on success increment child.acknowledgment").
    fn increment_acknowledgment(&self, id: ActivityId) -> Result<(), EngineError>;

    /// Mirror a task's `_schedule()` cycle count onto its row (spec §4.4
    /// step 3: "Increments schedule_count"). The caller passes the running
    /// total from `TaskState` rather than a delta, since the snapshot — not
    /// the row — is the authoritative counter between job boundaries.
    fn set_schedule_count(&self, id: ActivityId, count: u64) -> Result<(), EngineError>;

    /// Insert an immutable (inputs/outputs) or mutable (snapshot) blob row,
    /// returning its fresh [`BlobId`] (spec §3: inputs/outputs/snapshot are
    /// each a foreign key to a blob row).
    fn put_blob(&self, blob: CompressedBlob) -> BlobId;

    fn get_blob(&self, id: BlobId) -> Result<CompressedBlob, EngineError>;
}

struct Inner {
    activities: HashMap<ActivityId, Activity>,
    /// `descendant -> Vec<(ancestor, distance)>`, kept alongside the forward
    /// map so both query directions stay O(descendants-of-id) (spec §3:
    /// `(ancestor, descendant)` and `(descendant, distance)` are each unique).
    relationships: Vec<ActivityRelationship>,
    blobs: HashMap<BlobId, CompressedBlob>,
}

/// In-memory reference `Store`, guarded by a single lock per the teacher's
/// `MaterializedState` pattern — every method here stands in for one
/// savepoint-guarded transaction.
pub struct InMemoryStore<C: Clock> {
    inner: Mutex<Inner>,
    clock: C,
}

impl<C: Clock> InMemoryStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner {
                activities: HashMap::new(),
                relationships: Vec::new(),
                blobs: HashMap::new(),
            }),
            clock,
        }
    }

    /// Insert the transitive-closure rows for a new child under `parent`
    /// (spec §3: "one row at distance 1 plus one row per
    /// (grand-ancestor, distance+1)"). Called while already holding the
    /// lock, as part of the same "transaction" as the row insert (spec I7).
    fn link_child(inner: &mut Inner, child: ActivityId, parent: ActivityId) {
        inner.relationships.push(ActivityRelationship { ancestor: parent, descendant: child, distance: 1 });
        let grand_ancestors: Vec<(ActivityId, u32)> = inner
            .relationships
            .iter()
            .filter(|r| r.descendant == parent)
            .map(|r| (r.ancestor, r.distance + 1))
            .collect();
        for (ancestor, distance) in grand_ancestors {
            inner.relationships.push(ActivityRelationship { ancestor, descendant: child, distance });
        }
    }
}

impl<C: Clock> Store for InMemoryStore<C> {
    fn insert_activity(
        &self,
        name: &str,
        parent: Option<ActivityId>,
        inputs: Option<BlobId>,
    ) -> Result<Activity, EngineError> {
        let now = self.clock.epoch_ms();
        let now = chrono::DateTime::from_timestamp_millis(now as i64).unwrap_or_else(Utc::now);
        let mut inner = self.inner.lock();
        let id = ActivityId::new();
        let row = Activity::new(id, name, parent, inputs, now);
        inner.activities.insert(id, row.clone());
        if let Some(parent) = parent {
            Self::link_child(&mut inner, id, parent);
        }
        Ok(row)
    }

    fn get(&self, id: ActivityId) -> Result<Activity, EngineError> {
        self.inner.lock().activities.get(&id).cloned().ok_or(EngineError::NotFound { id })
    }

    fn get_if_state(&self, id: ActivityId, state: ActivityState) -> Result<Option<Activity>, EngineError> {
        let inner = self.inner.lock();
        let row = inner.activities.get(&id).ok_or(EngineError::NotFound { id })?;
        Ok((row.state == state).then(|| row.clone()))
    }

    fn transit(
        &self,
        id: ActivityId,
        to_state: ActivityState,
        patch: TransitPatch,
    ) -> Result<TransitOutcome, EngineError> {
        let now = self.clock.epoch_ms();
        let now = chrono::DateTime::from_timestamp_millis(now as i64).unwrap_or_else(Utc::now);
        let mut inner = self.inner.lock();
        let row = inner.activities.get_mut(&id).ok_or(EngineError::NotFound { id })?;
        let from_state = row.state;
        let previous_snapshot = row.snapshot;
        let new_snapshot = patch.snapshot;
        let outcome = transit::transit(row, to_state, patch, now)?;
        tracing::debug!(
            activity_id = %id,
            from = %from_state,
            to = %outcome.effective_state,
            signal = outcome.signal.name(),
            "activity transitioned"
        );
        // The snapshot row is rewritten, not appended — at most one per
        // activity (spec §4.2 step 4). Whatever blob `row.snapshot` no
        // longer points at is orphaned and can be deleted.
        if let Some(previous) = previous_snapshot {
            let still_referenced = match new_snapshot {
                Some(fresh) => !outcome.effective_state.is_archived() && fresh == previous,
                None => false,
            };
            if !still_referenced {
                inner.blobs.remove(&previous);
            }
        }
        Ok(outcome)
    }

    fn appoint(&self, id: ActivityId, appointment: Appointment) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        {
            let row = inner.activities.get_mut(&id).ok_or(EngineError::NotFound { id })?;
            transit::appoint_one(row, appointment)?;
        }
        tracing::debug!(activity_id = %id, appointment = ?appointment, "activity appointed");
        let descendants: Vec<ActivityId> = inner
            .relationships
            .iter()
            .filter(|r| r.ancestor == id)
            .map(|r| r.descendant)
            .collect();
        for descendant in descendants {
            if let Some(row) = inner.activities.get_mut(&descendant) {
                // Best-effort: a descendant that's already archived or
                // superseded simply declines the appointment (spec §4.2).
                let _ = transit::appoint_one(row, appointment);
            }
        }
        Ok(())
    }

    fn descendants(&self, id: ActivityId) -> Result<Vec<ActivityId>, EngineError> {
        let inner = self.inner.lock();
        Ok(inner
            .relationships
            .iter()
            .filter(|r| r.ancestor == id && !inner.activities.get(&r.descendant).map(|a| a.state.is_archived()).unwrap_or(true))
            .map(|r| r.descendant)
            .collect())
    }

    fn parent_of(&self, id: ActivityId) -> Result<Option<ActivityId>, EngineError> {
        let inner = self.inner.lock();
        Ok(inner.relationships.iter().find(|r| r.descendant == id && r.distance == 1).map(|r| r.ancestor))
    }

    fn increment_acknowledgment(&self, id: ActivityId) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let row = inner.activities.get_mut(&id).ok_or(EngineError::NotFound { id })?;
        row.acknowledgment += 1;
        Ok(())
    }

    fn set_schedule_count(&self, id: ActivityId, count: u64) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let row = inner.activities.get_mut(&id).ok_or(EngineError::NotFound { id })?;
        row.schedule_count = count;
        Ok(())
    }

    fn put_blob(&self, blob: CompressedBlob) -> BlobId {
        let id = BlobId::new();
        self.inner.lock().blobs.insert(id, blob);
        id
    }

    fn get_blob(&self, id: BlobId) -> Result<CompressedBlob, EngineError> {
        self.inner
            .lock()
            .blobs
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::Store(format!("blob {id} not found")))
    }
}

/// A convenience alias used throughout the runtime/queue crates; reference
/// deployments hold one shared `Arc<DynStore>`.
///
/// `Store::transit`/`appoint` return their [`modbpm_core::Signal`] inline rather than
/// emitting it internally — callers must only dispatch it once the
/// surrounding job has committed (spec I7), which for this in-memory
/// reference store means: once the `Result` has been matched on `Ok`.
pub type DynStore = dyn Store;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
