// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four job-queue entry points as a named, serializable job (spec
//! §4.6) and the `JobQueue` trait every engine instance is built against.
//!
//! The engine only ever needs `enqueue(name, args, countdown)` from its job
//! queue (spec §7: "only the ability to enqueue a named job with arguments
//! and a delay is required"); the transport, worker pool, and retry policy
//! are all out of scope here (SPEC_FULL.md Non-goals) and are left to the
//! embedding application, the way `oj-core::Effect` is a closed enum of
//! named side effects an external executor performs.

use modbpm_core::{ActivityId, ActivityState};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One unit of work posted to the external job queue (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Job {
    Initiate { id: ActivityId },
    Schedule { id: ActivityId },
    Transit { id: ActivityId, to_state: ActivityState },
    Acknowledge { id: ActivityId },
}

impl Job {
    /// Job name for log spans, matching the entry-point names in spec §4.6.
    pub fn name(&self) -> &'static str {
        match self {
            Job::Initiate { .. } => "initiate",
            Job::Schedule { .. } => "schedule",
            Job::Transit { .. } => "transit",
            Job::Acknowledge { .. } => "acknowledge",
        }
    }

    pub fn activity_id(&self) -> ActivityId {
        match self {
            Job::Initiate { id }
            | Job::Schedule { id }
            | Job::Transit { id, .. }
            | Job::Acknowledge { id } => *id,
        }
    }
}

/// The external job queue's contract (spec §7): "enqueue(name, args,
/// countdown ≥ 0), at-least-once delivery, best-effort ordering."
/// Exactly-once is neither required nor relied on — every job handler in
/// `jobs.rs` is idempotent via its own state+token selector.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: Job, countdown_secs: u64);
}

/// Reference `JobQueue` for tests and single-process demos: jobs with a
/// zero countdown are immediately poppable, delayed ones sit in a side
/// queue until the caller explicitly fires them. A production deployment
/// would back this with the embedding application's real queue instead.
#[derive(Default)]
pub struct InMemoryJobQueue {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    ready: VecDeque<Job>,
    delayed: Vec<(Job, u64)>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the next immediately-runnable job, FIFO.
    pub fn pop_ready(&self) -> Option<Job> {
        self.inner.lock().ready.pop_front()
    }

    /// Drain every delayed job regardless of its countdown — stands in for
    /// "enough wall-clock time has passed" in tests that don't model a real
    /// timer.
    pub fn drain_delayed(&self) -> Vec<Job> {
        std::mem::take(&mut self.inner.lock().delayed).into_iter().map(|(job, _)| job).collect()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.ready.is_empty() && inner.delayed.is_empty()
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&self, job: Job, countdown_secs: u64) {
        let mut inner = self.inner.lock();
        if countdown_secs == 0 {
            inner.ready.push_back(job);
        } else {
            inner.delayed.push((job, countdown_secs));
        }
    }
}

#[cfg(test)]
#[path = "jobqueue_tests.rs"]
mod tests;
