// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four job-queue entry points (spec §4.6) and the global exception
//! handler that wraps all of them.
//!
//! Grounded on `oj-daemon`'s `Runtime<C>` — a thin struct bundling the
//! collaborators a job handler needs (here: `Store`, `JobQueue`,
//! `ActivityRegistry`, `EngineConfig`) with one method per entry point,
//! each a short idempotent transaction per spec §4.6's "idempotent,
//! short-running" requirement.

use crate::jobqueue::{Job, JobQueue};
use crate::router::SignalRouter;
use modbpm_core::{ActivityArgs, ActivityId, ActivityState, EngineConfig, EngineError, Signal};
use modbpm_runtime::process::{ProcessStep, Process};
use modbpm_runtime::task::{InitiateOutcome, ScheduleStep};
use modbpm_runtime::{ActivityRegistry, ProcessState, Runtime, RuntimeSnapshot, StepOutcome, TaskState};
use modbpm_store::{Activity, Store, TransitPatch};

/// Bundles the collaborators every job handler needs. Constructed once by
/// the embedding application and shared across workers (spec §5: "any job
/// may run on any worker; the only synchronization between workers is the
/// DB").
pub struct Engine<'a> {
    pub store: &'a dyn Store,
    pub queue: &'a dyn JobQueue,
    pub registry: &'a ActivityRegistry,
    pub config: &'a EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        store: &'a dyn Store,
        queue: &'a dyn JobQueue,
        registry: &'a ActivityRegistry,
        config: &'a EngineConfig,
    ) -> Self {
        Self { store, queue, registry, config }
    }

    /// Insert a fresh root activity and fire the `activity_created` signal
    /// (spec §2's data flow: "user starts a process → row inserted in state
    /// CREATED → `activity_created` signal → `initiate` job"). Not itself
    /// one of the four job-queue entry points — the user-facing start call
    /// that kicks the whole pipeline off.
    pub fn start(&self, class_name: &str, args: ActivityArgs) -> Result<ActivityId, EngineError> {
        let inputs = self.persist_if_present(&args)?;
        let row = self.store.insert_activity(class_name, None, inputs)?;
        SignalRouter::route(self.store, self.queue, self.config, Signal::ActivityCreated { id: row.id })?;
        Ok(row.id)
    }

    /// Drain one job from `queue` and dispatch it to the matching entry
    /// point. A convenience driver for single-process demos and tests; a
    /// real deployment dispatches jobs as its worker pool receives them
    /// (spec §5 "outer" layer).
    pub fn drain_one(&self, job: Job) -> Result<(), EngineError> {
        match job {
            Job::Initiate { id } => self.initiate(id),
            Job::Schedule { id } => self.schedule(id),
            Job::Transit { id, to_state } => self.transit(id, to_state),
            Job::Acknowledge { id } => self.acknowledge(id),
        }
    }

    /// **`initiate(act_id)`** (spec §4.6): selector `pk=? AND
    /// state=CREATED`. Resolves the class, calls `on_start`, and — unless
    /// the runtime object archived synchronously — transits CREATED →
    /// READY carrying a fresh snapshot.
    pub fn initiate(&self, id: ActivityId) -> Result<(), EngineError> {
        let Some(row) = self.store.get_if_state(id, ActivityState::Created)? else {
            tracing::debug!(activity_id = %id, "initiate: not in CREATED, skipping");
            return Ok(());
        };
        tracing::info!(activity_id = %id, class = %row.name, "initiate");
        match self.try_initiate(&row) {
            Ok(()) => Ok(()),
            Err(err) => self.global_exception_handler(id, err),
        }
    }

    fn try_initiate(&self, row: &Activity) -> Result<(), EngineError> {
        self.inherit_parent_appointment(row)?;
        let args = self.load_inputs(row)?;
        match self.registry.construct(&row.name)? {
            Runtime::Task(mut task) => {
                let mut state = TaskState::default();
                match modbpm_runtime::task::initiate(task.as_mut(), &mut state, &args)? {
                    InitiateOutcome::Proceed => self.advance_to_ready(row.id, RuntimeSnapshot::Task(state)),
                    InitiateOutcome::ArchiveNow(outcome) => self.archive(row.id, outcome),
                }
            }
            Runtime::Process(mut process) => {
                let mut state = ProcessState::default();
                modbpm_runtime::process::initiate(process.as_mut(), &mut state)?;
                self.advance_to_ready(row.id, RuntimeSnapshot::Process(state))
            }
        }
    }

    /// spec §4.6: "Inherits the parent's appointment if any" — covers a
    /// child spawned after `_appoint` already swept the then-existing
    /// subtree (spec §4.2).
    fn inherit_parent_appointment(&self, row: &Activity) -> Result<(), EngineError> {
        let Some(parent_id) = row.parent else { return Ok(()) };
        let parent = self.store.get(parent_id)?;
        if let Some(appointment) = parent.appointment {
            self.store.appoint(row.id, appointment)?;
        }
        Ok(())
    }

    /// **`schedule(act_id)`** (spec §4.6): selector `pk=? AND
    /// state=READY`. Transits READY → RUNNING, resumes the runtime object
    /// from its snapshot, drives it until it parks or archives, then
    /// transits RUNNING → BLOCKED (or archives).
    pub fn schedule(&self, id: ActivityId) -> Result<(), EngineError> {
        let Some(row) = self.store.get_if_state(id, ActivityState::Ready)? else {
            tracing::debug!(activity_id = %id, "schedule: not in READY, skipping");
            return Ok(());
        };
        let transit_outcome = self.store.transit(id, ActivityState::Running, TransitPatch::default())?;
        let reached_running = transit_outcome.reached_requested;
        SignalRouter::route(self.store, self.queue, self.config, transit_outcome.signal)?;
        if !reached_running {
            // An appointment (e.g. inherited from the parent) redirected this
            // transition to SUSPENDED/REVOKED instead of RUNNING — nothing to
            // schedule (spec §4.2 step 2).
            tracing::debug!(activity_id = %id, state = %transit_outcome.effective_state, "schedule: redirected by appointment");
            return Ok(());
        }
        tracing::info!(activity_id = %id, class = %row.name, "schedule");
        match self.try_schedule(&row) {
            Ok(()) => Ok(()),
            Err(err) => self.global_exception_handler(id, err),
        }
    }

    fn try_schedule(&self, row: &Activity) -> Result<(), EngineError> {
        let args = self.load_inputs(row)?;
        let snapshot = self.load_snapshot(row)?;
        match (self.registry.construct(&row.name)?, snapshot) {
            (Runtime::Task(mut task), RuntimeSnapshot::Task(mut state)) => {
                let step = modbpm_runtime::task::schedule_step(task.as_mut(), &mut state, &args, self.config)?;
                self.store.set_schedule_count(row.id, state.cycles())?;
                match step {
                    ScheduleStep::Archive(outcome) => self.archive(row.id, outcome),
                    ScheduleStep::Rearm(secs) => self.park(row.id, RuntimeSnapshot::Task(state), Some(secs), Vec::new()),
                    ScheduleStep::Park => self.park(row.id, RuntimeSnapshot::Task(state), None, Vec::new()),
                }
            }
            (Runtime::Process(process), RuntimeSnapshot::Process(mut state)) => {
                let strictness = process.strictness();
                let mut spawned = Vec::new();
                loop {
                    match modbpm_runtime::process::schedule_step(row.id, self.store, self.config, &mut state, strictness)? {
                        ProcessStep::Progress { spawned: new } => spawned.extend(new),
                        ProcessStep::Park => return self.park(row.id, RuntimeSnapshot::Process(state), None, spawned),
                        ProcessStep::Archive(outcome) => {
                            for signal in spawned {
                                SignalRouter::route(self.store, self.queue, self.config, signal)?;
                            }
                            return self.archive(row.id, outcome);
                        }
                    }
                }
            }
            _ => Err(EngineError::Uncategorized(format!(
                "activity {} snapshot shape does not match its registered class",
                row.id
            ))),
        }
    }

    /// **`transit(act_id, to_state)`** (spec §4.6): the unconditional
    /// landing point for a deferred `_lazy_transit`. A stale re-delivery
    /// (the row already moved on) is an invariant violation and is left
    /// for the job queue's own retry policy rather than archived.
    pub fn transit(&self, id: ActivityId, to_state: ActivityState) -> Result<(), EngineError> {
        tracing::info!(activity_id = %id, state = %to_state, "transit");
        match self.store.transit(id, to_state, TransitPatch::default()) {
            Ok(outcome) => SignalRouter::route(self.store, self.queue, self.config, outcome.signal),
            Err(err) if err.is_invariant_violation() => Err(err),
            Err(err) => self.global_exception_handler(id, err),
        }
    }

    /// **`acknowledge(act_id)`** (spec §4.6): selector `pk=? AND
    /// acknowledgment=0`. Retries waking the parent.
    pub fn acknowledge(&self, id: ActivityId) -> Result<(), EngineError> {
        let row = self.store.get(id)?;
        if row.acknowledgment != 0 {
            tracing::debug!(activity_id = %id, "acknowledge: already acknowledged, skipping");
            return Ok(());
        }
        tracing::info!(activity_id = %id, "acknowledge");
        SignalRouter::wake_up_parent_activity(self.store, self.queue, self.config, id)
    }

    /// Catches `Finished`/`Failed`/import/instantiation/runtime failures
    /// and converts them into a `finish()` call with the matching
    /// `status_code` (spec §4.6, §7). Internal invariant violations
    /// (missing row, illegal edge, token race) are re-raised unchanged —
    /// the job queue's own retry policy owns those, not this handler.
    fn global_exception_handler(&self, id: ActivityId, err: EngineError) -> Result<(), EngineError> {
        if err.is_invariant_violation() {
            return Err(err);
        }
        let status_code = err.status_code();
        tracing::warn!(activity_id = %id, status_code, error = %err, "job handler caught exception, failing activity");
        self.archive(id, StepOutcome::failed(status_code, serde_json::Value::String(err.to_string())))
    }

    fn advance_to_ready(&self, id: ActivityId, snapshot: RuntimeSnapshot) -> Result<(), EngineError> {
        let snapshot_id = self.persist_snapshot(&snapshot)?;
        let outcome =
            self.store.transit(id, ActivityState::Ready, TransitPatch { snapshot: Some(snapshot_id), ..Default::default() })?;
        SignalRouter::route(self.store, self.queue, self.config, outcome.signal)
        // `_destroy()` (spec §4.3) is a no-op here: there are no live
        // micro-threads to kill, only the snapshot just written.
    }

    fn park(
        &self,
        id: ActivityId,
        snapshot: RuntimeSnapshot,
        rearm_secs: Option<u64>,
        spawned: Vec<Signal>,
    ) -> Result<(), EngineError> {
        for signal in spawned {
            SignalRouter::route(self.store, self.queue, self.config, signal)?;
        }
        let snapshot_id = self.persist_snapshot(&snapshot)?;
        let outcome =
            self.store.transit(id, ActivityState::Blocked, TransitPatch { snapshot: Some(snapshot_id), ..Default::default() })?;
        if let Some(secs) = rearm_secs {
            SignalRouter::route(
                self.store,
                self.queue,
                self.config,
                modbpm_store::lazy_transit(id, ActivityState::Ready, secs),
            )?;
        }
        SignalRouter::route(self.store, self.queue, self.config, outcome.signal)
    }

    fn archive(&self, id: ActivityId, outcome: StepOutcome) -> Result<(), EngineError> {
        let StepOutcome::Archive { status_code, outputs } = outcome else {
            return Ok(());
        };
        let to_state = if status_code.is_success() { ActivityState::Finished } else { ActivityState::Failed };
        let outputs_id = if outputs.is_empty() { None } else { Some(self.persist_outputs(&outputs)?) };
        let patch = TransitPatch { outputs: outputs_id, status_code: Some(status_code.0), ..Default::default() };
        let transit_outcome = self.store.transit(id, to_state, patch)?;
        tracing::info!(activity_id = %id, state = %to_state, status_code = status_code.0, "archive");
        SignalRouter::route(self.store, self.queue, self.config, transit_outcome.signal)
    }

    fn load_inputs(&self, row: &Activity) -> Result<ActivityArgs, EngineError> {
        match row.inputs {
            Some(blob_id) => {
                let blob = self.store.get_blob(blob_id)?;
                modbpm_core::decompress(&blob).map_err(|e| EngineError::Store(e.to_string()))
            }
            None => Ok(ActivityArgs::default()),
        }
    }

    fn load_snapshot(&self, row: &Activity) -> Result<RuntimeSnapshot, EngineError> {
        let blob_id = row
            .snapshot
            .ok_or_else(|| EngineError::Uncategorized(format!("activity {} has no snapshot to resume", row.id)))?;
        let blob = self.store.get_blob(blob_id)?;
        modbpm_core::decompress(&blob).map_err(|e| EngineError::Store(e.to_string()))
    }

    fn persist_if_present(&self, args: &ActivityArgs) -> Result<Option<modbpm_core::BlobId>, EngineError> {
        if args.is_empty() {
            return Ok(None);
        }
        let blob = modbpm_core::compress(args, self.config).map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(Some(self.store.put_blob(blob)))
    }

    fn persist_snapshot(&self, snapshot: &RuntimeSnapshot) -> Result<modbpm_core::BlobId, EngineError> {
        let blob = modbpm_core::compress(snapshot, self.config).map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(self.store.put_blob(blob))
    }

    fn persist_outputs(&self, outputs: &modbpm_core::ActivityOutputs) -> Result<modbpm_core::BlobId, EngineError> {
        let blob = modbpm_core::compress(outputs, self.config).map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(self.store.put_blob(blob))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
