// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The signal → job wiring table (spec §4.6, Design Notes §9's "signal bus
//! → direct typed emit interface" redesign).
//!
//! `SignalRouter` has no state of its own: routing a [`Signal`] is either a
//! plain `JobQueue::enqueue` call or, for an archival transition, the
//! synchronous `wake_up_parent_activity` handler (spec §4.6) that attempts
//! to unblock the parent in-process and falls back to a delayed
//! `acknowledge` job on failure. Grounded on `oj-daemon`'s `handle_event`
//! dispatch (match on what happened, enqueue/act on the matching effect).

use crate::jobqueue::{Job, JobQueue};
use modbpm_core::{ActivityState, EngineConfig, EngineError, Signal};
use modbpm_store::{Store, TransitPatch};

pub struct SignalRouter;

impl SignalRouter {
    /// Dispatch one signal (spec §4.6 "Signal→job wiring").
    pub fn route(
        store: &dyn Store,
        queue: &dyn JobQueue,
        config: &EngineConfig,
        signal: Signal,
    ) -> Result<(), EngineError> {
        match signal {
            Signal::ActivityCreated { id } => {
                queue.enqueue(Job::Initiate { id }, 0);
                Ok(())
            }
            Signal::ActivityTransitioned { id, to_state: ActivityState::Ready } => {
                queue.enqueue(Job::Schedule { id }, 0);
                Ok(())
            }
            Signal::ActivityTransitioned { id, to_state } if to_state.is_archived() => {
                Self::wake_up_parent_activity(store, queue, config, id)
            }
            Signal::ActivityTransitioned { .. } => Ok(()),
            Signal::LazyTransit { id, to_state, countdown_secs } => {
                queue.enqueue(Job::Transit { id, to_state }, countdown_secs);
                Ok(())
            }
        }
    }

    /// spec §4.6: "if parent exists and parent ∉ ARCHIVED and parent ≠
    /// SUSPENDED, `_transit(parent, READY)`; on success increment
    /// `child.acknowledgment`; on failure enqueue an `acknowledge(child)`
    /// job after `MODBPM_ACKNOWLEDGE_COUNTDOWN` seconds." Also the landing
    /// point for a retried `acknowledge` job, which re-sends this same
    /// attempt for `child_id` (spec §4.6 `acknowledge`'s doc).
    pub fn wake_up_parent_activity(
        store: &dyn Store,
        queue: &dyn JobQueue,
        config: &EngineConfig,
        child_id: modbpm_core::ActivityId,
    ) -> Result<(), EngineError> {
        let Some(parent_id) = store.parent_of(child_id)? else {
            return Ok(());
        };
        let parent = store.get(parent_id)?;
        if parent.state.is_archived() || parent.state == ActivityState::Suspended {
            return Ok(());
        }
        match store.transit(parent_id, ActivityState::Ready, TransitPatch::default()) {
            Ok(outcome) => {
                store.increment_acknowledgment(child_id)?;
                Self::route(store, queue, config, outcome.signal)
            }
            Err(_) => {
                queue.enqueue(Job::Acknowledge { id: child_id }, config.acknowledge_countdown_secs());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
