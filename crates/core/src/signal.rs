// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle signals (spec §4.6, §9 "Signal bus → typed emit interface").
//!
//! A [`Signal`] is emitted *after* the triggering transaction commits
//! (spec §3 I7) and is consumed by exactly one place in this workspace:
//! `modbpm-queue`'s `SignalRouter`, which turns it into a job-queue enqueue.
//! There is no general subscriber/listener model — the core only needs a
//! closed, typed description of "what just happened".

use crate::activity::ActivityId;
use crate::state::ActivityState;
use serde::{Deserialize, Serialize};

/// A signal raised by a successful state transition or by `_lazy_transit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Signal {
    /// An activity row was inserted in state CREATED (spec §2 data flow).
    #[serde(rename = "activity:created")]
    ActivityCreated { id: ActivityId },

    /// An activity reached a given state via a normal `_transit` (spec
    /// §4.6's `activity_<tostate>` naming). `READY`/`RUNNING`/`BLOCKED`
    /// are operationally meaningful (they drive `schedule`/`transit`
    /// jobs); `FINISHED`/`FAILED`/`REVOKED` are archival.
    #[serde(rename = "activity:transitioned")]
    ActivityTransitioned { id: ActivityId, to_state: ActivityState },

    /// Emitted by `_lazy_transit`: the activity stays in its current state
    /// but a delayed `transit` job should be enqueued (spec §4.2, §4.6).
    #[serde(rename = "activity:lazy_transit")]
    LazyTransit { id: ActivityId, to_state: ActivityState, countdown_secs: u64 },
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::ActivityCreated { .. } => "activity:created",
            Signal::ActivityTransitioned { to_state, .. } => match to_state {
                ActivityState::Ready => "activity:ready",
                ActivityState::Running => "activity:running",
                ActivityState::Blocked => "activity:blocked",
                ActivityState::Finished => "activity:finished",
                ActivityState::Failed => "activity:failed",
                ActivityState::Suspended => "activity:suspended",
                ActivityState::Revoked => "activity:revoked",
                ActivityState::Created => "activity:created",
            },
            Signal::LazyTransit { .. } => "activity:lazy_transit",
        }
    }

    pub fn activity_id(&self) -> ActivityId {
        match self {
            Signal::ActivityCreated { id }
            | Signal::ActivityTransitioned { id, .. }
            | Signal::LazyTransit { id, .. } => *id,
        }
    }

    pub fn log_summary(&self) -> String {
        match self {
            Signal::ActivityCreated { id } => format!("{} id={id}", self.name()),
            Signal::ActivityTransitioned { id, to_state } => {
                format!("{} id={id} to={to_state}", self.name())
            }
            Signal::LazyTransit { id, to_state, countdown_secs } => {
                format!("{} id={id} to={to_state} countdown={countdown_secs}s", self.name())
            }
        }
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
