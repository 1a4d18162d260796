// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `_transit`/`_appoint`/`_lazy_transit` primitives (spec §4.2).
//!
//! These are pure row-mutating functions; [`crate::store::InMemoryStore`]
//! wraps them with the locking and relationship-graph lookups that turn
//! them into the `Store` trait's transactional operations.

use crate::row::{reconcile_appointment, Activity, Appointment};
use chrono::{DateTime, Utc};
use modbpm_core::{can_transit, ActivityId, ActivityState, BlobId, EngineError, Signal, TokenCode};

/// Fields a caller may set as part of a `_transit` call (spec §4.2 step 4).
#[derive(Debug, Clone, Default)]
pub struct TransitPatch {
    pub outputs: Option<BlobId>,
    pub snapshot: Option<BlobId>,
    pub status_code: Option<i32>,
}

/// Outcome of a single `_transit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitOutcome {
    /// True iff the row reached the *requested* state, per spec §4.2 step 6.
    /// False when an appointment override took effect instead — the caller
    /// must not report success as if the requested state were reached.
    pub reached_requested: bool,
    pub effective_state: ActivityState,
    pub signal: Signal,
}

/// Apply the full `_transit` contract to `row` in place (spec §4.2 steps
/// 1-6, minus the savepoint/token-CAS mechanics which the caller's lock
/// already provides).
pub fn transit(
    row: &mut Activity,
    to_state: ActivityState,
    patch: TransitPatch,
    now: DateTime<Utc>,
) -> Result<TransitOutcome, EngineError> {
    // Step 1: to_state must be one of the directly-transitable targets.
    if !to_state.is_transitable_target() {
        return Err(EngineError::IllegalTransition { id: row.id, from: row.state, to: to_state });
    }

    // Step 3 (token half): a superseded row cannot be written.
    if !row.is_live() {
        return Err(EngineError::TokenMismatch { id: row.id });
    }

    // Step 2: appointment reconciliation.
    let (effective_state, consumed) = reconcile_appointment(row.state, to_state, row.appointment);
    let reached_requested = effective_state == to_state;

    // Step 3 (transition half): the effective edge must be legal.
    if !can_transit(row.state, effective_state) {
        return Err(EngineError::IllegalTransition { id: row.id, from: row.state, to: effective_state });
    }

    // Step 4: compute and apply the update set.
    row.token_code = Some(TokenCode::new());
    row.state = effective_state;
    if consumed {
        row.appointment = None;
    }
    if effective_state.is_archived() {
        if let Some(outputs) = patch.outputs {
            row.outputs = Some(outputs);
        }
        row.snapshot = None;
        row.date_archived = Some(now);
        row.status_code = Some(patch.status_code.unwrap_or(0).into());
    }
    if let Some(snapshot) = patch.snapshot {
        if !effective_state.is_archived() {
            row.snapshot = Some(snapshot);
        }
    }

    let signal = Signal::ActivityTransitioned { id: row.id, to_state: effective_state };
    Ok(TransitOutcome { reached_requested, effective_state, signal })
}

/// Set `appointment` on a single row, guarded by the same liveness check as
/// `_transit` (spec §4.2: "`_appoint` ... and all non-archived
/// descendants"). Propagation across descendants is the caller's
/// responsibility ([`crate::store::Store::appoint`]) since it requires the
/// relationship graph.
pub fn appoint_one(row: &mut Activity, appointment: Appointment) -> Result<bool, EngineError> {
    if !row.is_live() {
        return Err(EngineError::TokenMismatch { id: row.id });
    }
    if row.state.is_archived() {
        return Ok(false);
    }
    row.appointment = Some(appointment);
    row.token_code = Some(TokenCode::new());
    Ok(true)
}

/// Build the `lazy_transit` signal for `_lazy_transit(to_state, countdown)`
/// (spec §4.2). The row itself is left untouched — only a deferred `transit`
/// job should be enqueued by the caller.
pub fn lazy_transit(id: ActivityId, to_state: ActivityState, countdown_secs: u64) -> Signal {
    Signal::LazyTransit { id, to_state, countdown_secs }
}

#[cfg(test)]
#[path = "transit_tests.rs"]
mod tests;
