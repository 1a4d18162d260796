// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task runtime: a leaf activity, with an optional polling scheduler
//! (spec §4.4).
//!
//! `on_start` runs once, while the activity is still CREATED. A short task
//! just returns `StepOutcome::finished(..)`/`failed(..)` and never installs
//! a scheduler; a long-running task calls `ctx.set_scheduler(..)` and
//! returns `Continue`, after which `on_schedule` is driven once per
//! `schedule` job (spec §4.6) until it finishes.

use crate::interval::IntervalKind;
use crate::outcome::StepOutcome;
use modbpm_core::{ActivityArgs, EngineConfig, EngineError};
use serde::{Deserialize, Serialize};

pub trait Task: Send {
    fn on_start(&mut self, ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError>;

    /// Invoked once per `schedule` job while a scheduler is installed
    /// (spec §4.4). The default no-op is used by tasks that finish
    /// synchronously and never call `set_scheduler`.
    #[allow(unused_variables)]
    fn on_schedule(&mut self, ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        Ok(StepOutcome::Continue)
    }
}

/// The serializable snapshot of a task's runtime state (spec §3
/// `snapshot`), reconstructed fresh on every job boundary per Design Notes
/// §9 — there is no pickled micro-thread stack to restore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskState {
    scheduler: Option<IntervalKind>,
    /// Set when `on_start` asked to finish successfully. CREATED cannot
    /// transit directly to FINISHED (spec §6's transition table), so a
    /// success outcome is deferred until the activity reaches RUNNING and
    /// `schedule_step` is called there for the first time. A *failure*
    /// outcome from `on_start` doesn't need this — CREATED → FAILED is a
    /// legal edge and is archived immediately by the caller.
    pending_finish: Option<StepOutcome>,
    /// Running total of `_schedule()` cycles that actually invoked
    /// `on_schedule` (spec §4.4 step 3: "Increments schedule_count").
    /// Carried in the snapshot and mirrored onto `Activity::schedule_count`
    /// by the caller after each `schedule_step` call.
    cycles: u64,
}

impl TaskState {
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

pub struct TaskCtx<'a> {
    pub args: &'a ActivityArgs,
    state: &'a mut TaskState,
}

impl TaskCtx<'_> {
    /// Running total of `on_schedule` invocations so far, including the
    /// current one (spec §4.4 step 3's `schedule_count`). The only durable
    /// per-task progress a polling task gets across job boundaries, since
    /// the runtime object itself is rebuilt fresh every `schedule` job.
    pub fn schedule_count(&self) -> u64 {
        self.state.cycles
    }

    pub fn set_scheduler(&mut self, interval: IntervalKind) {
        self.state.scheduler = Some(interval);
    }

    /// `1², 2², 3², …` second backoff (spec §4.4).
    pub fn set_default_scheduler(&mut self) {
        self.set_scheduler(IntervalKind::default_scheduler());
    }

    pub fn set_static_scheduler(&mut self, secs: u64) {
        self.set_scheduler(IntervalKind::static_scheduler(secs));
    }

    /// Hands control to an external callback; `_schedule()` never re-arms
    /// itself (spec §4.4, §9).
    pub fn set_null_scheduler(&mut self) {
        self.set_scheduler(IntervalKind::null_scheduler());
    }
}

/// What the caller of `initiate` should do with the activity row (spec §4.6
/// `initiate` job).
#[derive(Debug)]
pub enum InitiateOutcome {
    /// Transit CREATED → READY carrying a fresh snapshot (spec §4.6).
    Proceed,
    /// `on_start` asked to finish with a non-success status — CREATED →
    /// FAILED is legal, so the caller archives immediately instead of
    /// proceeding to READY.
    ArchiveNow(StepOutcome),
}

/// Run `task.on_start` once (spec §4.3 `_initiate`).
pub fn initiate(
    task: &mut dyn Task,
    state: &mut TaskState,
    args: &ActivityArgs,
) -> Result<InitiateOutcome, EngineError> {
    let mut ctx = TaskCtx { args, state };
    let outcome = task.on_start(&mut ctx)?;
    match outcome {
        StepOutcome::Continue => Ok(InitiateOutcome::Proceed),
        StepOutcome::Archive { ref status_code, .. } if status_code.is_success() => {
            state.pending_finish = Some(outcome);
            Ok(InitiateOutcome::Proceed)
        }
        archive => Ok(InitiateOutcome::ArchiveNow(archive)),
    }
}

/// One iteration of `_schedule()` for a task (spec §4.4), invoked by the
/// `schedule` job while the activity is RUNNING.
#[derive(Debug)]
pub enum ScheduleStep {
    /// Archive the activity with this outcome now.
    Archive(StepOutcome),
    /// Re-arm via `_lazy_transit(READY, countdown)` after this many seconds.
    Rearm(u64),
    /// Nothing more to do; park the activity in BLOCKED.
    Park,
}

pub fn schedule_step(
    task: &mut dyn Task,
    state: &mut TaskState,
    args: &ActivityArgs,
    config: &EngineConfig,
) -> Result<ScheduleStep, EngineError> {
    if let Some(pending) = state.pending_finish.take() {
        return Ok(ScheduleStep::Archive(pending));
    }
    if state.scheduler.is_none() {
        return Ok(ScheduleStep::Park);
    }

    state.cycles += 1;
    let outcome = {
        let mut ctx = TaskCtx { args, state };
        task.on_schedule(&mut ctx)?
    };
    if outcome.is_archive() {
        tracing::debug!(cycles = state.cycles, "task archiving from on_schedule");
        return Ok(ScheduleStep::Archive(outcome));
    }

    match state.scheduler.as_mut().and_then(|gen| gen.next(config)) {
        Some(secs) => {
            tracing::debug!(cycles = state.cycles, rearm_secs = secs, "task re-arming");
            Ok(ScheduleStep::Rearm(secs))
        }
        None => Ok(ScheduleStep::Park),
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
