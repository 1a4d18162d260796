// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process runtime: a composite activity that spawns children and
//! implicitly completes once they're all accounted for (spec §4.5).
//!
//! Design Notes §9 replaces the original's cooperative micro-threads with an
//! explicit, serializable spawn plan. `on_start` runs exactly once, while
//! the activity is CREATED, and does nothing but describe the plan: which
//! classes to spawn, in what order, with what data-flow edges. It never
//! touches storage. `schedule_step` is the part that actually walks the
//! plan against the database — it is called once per `schedule` job and
//! again every time a child's archival wakes the process back up via
//! `acknowledge`/`wake_up_parent_activity` (spec §4.6) — spawning whatever
//! is newly unblocked and deciding whether the process is done.

use crate::outcome::StepOutcome;
use modbpm_core::{ActivityArgs, ActivityId, ActivityState, EngineConfig, EngineError, Signal};
use modbpm_store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub trait Process: Send {
    /// Describe the spawn plan (spec §4.5: "calls `self.start(...)` to spawn
    /// children"). Runs once; no storage access here — only `ctx.start(..)`.
    fn on_start(&mut self, ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError>;

    /// `AbstractProcess` is serial by default, `AbstractParallelProcess` is
    /// parallel by default (spec §4.5).
    fn default_mode(&self) -> SpawnMode {
        SpawnMode::Serial
    }

    /// `DefaultScheduleMixin`/`StrictScheduleMixin`/`LooseScheduleMixin`
    /// (spec §4.5).
    fn strictness(&self) -> ScheduleStrictness {
        ScheduleStrictness::Default
    }
}

/// Serial spawns join-before-return and become the next implicit ordering
/// checkpoint; parallel spawns fire-and-forget (spec §4.5, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnMode {
    Serial,
    Parallel,
}

/// How a process reacts to a child archiving in a state other than FINISHED
/// (spec §4.5, §9 — `StrictScheduleMixin`/`LooseScheduleMixin` are
/// implemented here rather than left as the original's documented TODO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStrictness {
    /// A non-FINISHED child is neither fatal nor ignored on its own — the
    /// process simply never reaches "all finished" and parks forever
    /// (mirrors the original's documented base-mixin behavior).
    Default,
    /// The process archives as FAILED the moment any child archives
    /// non-FINISHED; later unspawned handlers are never scheduled.
    Strict,
    /// Child failures are ignored entirely for completion purposes — a
    /// FAILED or REVOKED child still counts toward "this handler is done".
    Loose,
}

/// A first-class reference to a pending or live child (spec §4.5
/// "ActivityHandler"). Cheap to copy; the real state lives in
/// [`ProcessState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityHandler(usize);

/// An argument to a spawned child: either a literal value or a reference to
/// another handler's eventual output (spec §4.5 step 1: "if the argument is
/// itself a handler, replace it with the handler's final output").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArgValue {
    Literal(Value),
    FromHandler(ActivityHandler),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnArgs {
    pub args: Vec<ArgValue>,
    pub kwargs: HashMap<String, ArgValue>,
}

impl SpawnArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Literal(v)
    }
}

impl From<ActivityHandler> for ArgValue {
    fn from(h: ActivityHandler) -> Self {
        ArgValue::FromHandler(h)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HandlerSlot {
    class_name: String,
    /// Predecessor (ordering-only) edges, including the implicit checkpoint
    /// left by the last serial spawn (spec §5: "mode only affects whether
    /// THIS spawn blocks before returning").
    dependencies: Vec<ActivityHandler>,
    inputs: SpawnArgs,
    activity_id: Option<ActivityId>,
    /// Set instead of spawning when a data-flow predecessor never reached
    /// FINISHED — there is no output to resolve the args with, so this slot
    /// can never run. Counted as archived-but-not-finished for completion
    /// purposes so a loose process can still terminate.
    unreachable: bool,
}

/// The serializable spawn plan (spec §3 `snapshot`): every handler
/// registered by `on_start`, in registration order, plus whichever of them
/// have since been spawned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessState {
    handlers: Vec<HandlerSlot>,
    last_serial_spawn: Option<ActivityHandler>,
    /// Count of archived children observed at the end of the previous
    /// `schedule_step` call (spec §4.5 rule 2: "if archived changed since
    /// the last call, return true").
    archived_seen: usize,
}

pub struct ProcessCtx<'a> {
    state: &'a mut ProcessState,
    mode: SpawnMode,
}

impl<'a> ProcessCtx<'a> {
    fn new(state: &'a mut ProcessState, mode: SpawnMode) -> Self {
        Self { state, mode }
    }

    pub fn set_serial(&mut self) {
        self.mode = SpawnMode::Serial;
    }

    pub fn set_parallel(&mut self) {
        self.mode = SpawnMode::Parallel;
    }

    /// `run_in_serial { ... }` — restores the prior mode on every exit,
    /// including an early return via `?` (spec §4.5).
    pub fn run_in_serial<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scoped_mode(SpawnMode::Serial, f)
    }

    pub fn run_in_parallel<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scoped_mode(SpawnMode::Parallel, f)
    }

    fn scoped_mode<R>(&mut self, mode: SpawnMode, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.mode;
        self.mode = mode;
        let result = f(self);
        self.mode = previous;
        result
    }

    /// Register a child spawn (spec §4.5: `self.start(Class,
    /// predecessors=[...])`). Under serial mode the call also becomes the
    /// implicit ordering checkpoint for every subsequent spawn.
    pub fn start(
        &mut self,
        class_name: impl Into<String>,
        predecessors: &[ActivityHandler],
        inputs: SpawnArgs,
    ) -> ActivityHandler {
        let mut dependencies: Vec<ActivityHandler> = predecessors.to_vec();
        if let Some(checkpoint) = self.state.last_serial_spawn {
            if !dependencies.contains(&checkpoint) {
                dependencies.push(checkpoint);
            }
        }
        let handle = ActivityHandler(self.state.handlers.len());
        self.state.handlers.push(HandlerSlot {
            class_name: class_name.into(),
            dependencies,
            inputs,
            activity_id: None,
            unreachable: false,
        });
        if self.mode == SpawnMode::Serial {
            self.state.last_serial_spawn = Some(handle);
        }
        handle
    }
}

/// Run `process.on_start` once (spec §4.3 `_initiate`, specialized for
/// composites). Builds the spawn plan; nothing is written to storage yet.
pub fn initiate(process: &mut dyn Process, state: &mut ProcessState) -> Result<(), EngineError> {
    let mode = process.default_mode();
    let mut ctx = ProcessCtx::new(state, mode);
    process.on_start(&mut ctx)
}

/// What the caller (the `schedule` job, or `wake_up_parent_activity` via
/// `acknowledge`) should do after one call to `schedule_step`.
pub enum ProcessStep {
    /// Slots were spawned this call, or a new archival was observed — the
    /// caller should invoke `schedule_step` again before parking (spec §4.5
    /// rule 2).
    Progress { spawned: Vec<Signal> },
    /// Nothing left to do; park in BLOCKED.
    Park,
    /// Archive the process now (implicit completion, or a strict fast-fail).
    Archive(StepOutcome),
}

/// One iteration of `DefaultScheduleMixin._schedule` (spec §4.5), and its
/// `Strict`/`Loose` variants.
pub fn schedule_step(
    process_id: ActivityId,
    store: &dyn Store,
    config: &EngineConfig,
    state: &mut ProcessState,
    strictness: ScheduleStrictness,
) -> Result<ProcessStep, EngineError> {
    let mut spawned = Vec::new();

    // Resolve any data-flow predecessors that finished this cycle and mark
    // slots permanently unreachable if a data-flow predecessor failed.
    mark_unreachable_slots(store, state)?;

    // Spawn every slot whose dependencies are now satisfied. Loop to a
    // fixed point: spawning one slot can satisfy another's dependency in
    // the same cycle.
    loop {
        let mut progressed = false;
        for idx in 0..state.handlers.len() {
            if state.handlers[idx].activity_id.is_some() || state.handlers[idx].unreachable {
                continue;
            }
            if !dependencies_satisfied(store, state, idx, strictness)? {
                continue;
            }
            if strictness == ScheduleStrictness::Strict && any_non_finished_archival(store, state)? {
                // Scenario 4: later spawns are never scheduled once the
                // strict process has already decided to fail.
                continue;
            }
            let args = resolve_inputs(store, state, idx)?;
            let inputs_id = if args.is_empty() {
                None
            } else {
                let blob = modbpm_core::compress(&args, config).map_err(|e| EngineError::Store(e.to_string()))?;
                Some(store.put_blob(blob))
            };
            let child = store.insert_activity(&state.handlers[idx].class_name, Some(process_id), inputs_id)?;
            state.handlers[idx].activity_id = Some(child.id);
            tracing::debug!(
                activity_id = %process_id,
                child_id = %child.id,
                class = %state.handlers[idx].class_name,
                "process spawned child"
            );
            spawned.push(Signal::ActivityCreated { id: child.id });
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    if strictness == ScheduleStrictness::Strict {
        if let Some(status_code) = first_non_finished_status(store, state)? {
            tracing::info!(activity_id = %process_id, status_code, "strict process failing fast");
            return Ok(ProcessStep::Archive(StepOutcome::failed(status_code, Value::Null)));
        }
    }

    let counts = completion_counts(store, state, strictness)?;

    if !spawned.is_empty() {
        state.archived_seen = counts.archived;
        return Ok(ProcessStep::Progress { spawned });
    }

    if counts.archived != state.archived_seen {
        state.archived_seen = counts.archived;
        return Ok(ProcessStep::Progress { spawned });
    }

    if counts.completed == state.handlers.len() && counts.blocked == 0 {
        return Ok(ProcessStep::Archive(StepOutcome::finished(None)));
    }

    Ok(ProcessStep::Park)
}

#[derive(Default)]
struct CompletionCounts {
    /// Handlers whose spawn is done in the sense this mixin cares about:
    /// FINISHED for Default/Strict, any archived state for Loose.
    completed: usize,
    /// Handlers whose child has archived at all (any state), used only for
    /// the "did archived change" re-entry rule.
    archived: usize,
    /// Handlers not yet spawned and not permanently unreachable.
    blocked: usize,
}

fn completion_counts(
    store: &dyn Store,
    state: &ProcessState,
    strictness: ScheduleStrictness,
) -> Result<CompletionCounts, EngineError> {
    let mut counts = CompletionCounts::default();
    for slot in &state.handlers {
        if slot.unreachable {
            counts.archived += 1;
            if strictness == ScheduleStrictness::Loose {
                counts.completed += 1;
            }
            continue;
        }
        let Some(id) = slot.activity_id else {
            counts.blocked += 1;
            continue;
        };
        let child = store.get(id)?;
        if child.state.is_archived() {
            counts.archived += 1;
            let counts_as_completed = child.state == ActivityState::Finished || strictness == ScheduleStrictness::Loose;
            if counts_as_completed {
                counts.completed += 1;
            }
        }
    }
    Ok(counts)
}

fn any_non_finished_archival(store: &dyn Store, state: &ProcessState) -> Result<bool, EngineError> {
    for slot in &state.handlers {
        if slot.unreachable {
            return Ok(true);
        }
        if let Some(id) = slot.activity_id {
            let child = store.get(id)?;
            if child.state.is_archived() && child.state != ActivityState::Finished {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn first_non_finished_status(store: &dyn Store, state: &ProcessState) -> Result<Option<i32>, EngineError> {
    for slot in &state.handlers {
        if slot.unreachable {
            return Ok(Some(modbpm_core::StatusCode::UNCATEGORIZED.0));
        }
        if let Some(id) = slot.activity_id {
            let child = store.get(id)?;
            if child.state.is_archived() && child.state != ActivityState::Finished {
                return Ok(child.status_code.map(|c| c.0).or(Some(modbpm_core::StatusCode::UNCATEGORIZED.0)));
            }
        }
    }
    Ok(None)
}

/// Ordering deps are satisfied per `strictness`; data-flow deps (referenced
/// from `inputs`) always require FINISHED, since only a finished producer
/// has a usable `outputs.data` (spec §4.5 step 1).
fn dependencies_satisfied(
    store: &dyn Store,
    state: &ProcessState,
    idx: usize,
    strictness: ScheduleStrictness,
) -> Result<bool, EngineError> {
    let data_flow_deps = data_flow_dependencies(&state.handlers[idx].inputs);
    for dep in &state.handlers[idx].dependencies {
        if !handler_archived_as(store, state, *dep, required_state_for(strictness))? {
            return Ok(false);
        }
    }
    for dep in data_flow_deps {
        if !handler_archived_as(store, state, dep, Some(ActivityState::Finished))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn required_state_for(strictness: ScheduleStrictness) -> Option<ActivityState> {
    match strictness {
        ScheduleStrictness::Loose => None,
        ScheduleStrictness::Default | ScheduleStrictness::Strict => Some(ActivityState::Finished),
    }
}

/// True once `dep`'s child satisfies `required` (`None` = any archived
/// state is enough, matching loose join semantics).
fn handler_archived_as(
    store: &dyn Store,
    state: &ProcessState,
    dep: ActivityHandler,
    required: Option<ActivityState>,
) -> Result<bool, EngineError> {
    let slot = &state.handlers[dep.0];
    if slot.unreachable {
        // An unreachable predecessor never resolves to anything meaningful;
        // downstream ordering-only dependents may still proceed under Loose.
        return Ok(required.is_none());
    }
    let Some(id) = slot.activity_id else {
        return Ok(false);
    };
    let child = store.get(id)?;
    if !child.state.is_archived() {
        return Ok(false);
    }
    Ok(match required {
        Some(want) => child.state == want,
        None => true,
    })
}

fn data_flow_dependencies(inputs: &SpawnArgs) -> Vec<ActivityHandler> {
    let mut deps = Vec::new();
    for value in inputs.args.iter().chain(inputs.kwargs.values()) {
        if let ArgValue::FromHandler(h) = value {
            deps.push(*h);
        }
    }
    deps
}

/// Permanently mark slots unreachable whose data-flow predecessor just
/// archived as something other than FINISHED — there will never be output
/// data to resolve their args with.
fn mark_unreachable_slots(store: &dyn Store, state: &mut ProcessState) -> Result<(), EngineError> {
    let mut newly_unreachable = Vec::new();
    for (idx, slot) in state.handlers.iter().enumerate() {
        if slot.unreachable || slot.activity_id.is_some() {
            continue;
        }
        for dep in data_flow_dependencies(&slot.inputs) {
            let dep_slot = &state.handlers[dep.0];
            if dep_slot.unreachable {
                newly_unreachable.push(idx);
                break;
            }
            if let Some(id) = dep_slot.activity_id {
                let child = store.get(id)?;
                if child.state.is_archived() && child.state != ActivityState::Finished {
                    newly_unreachable.push(idx);
                    break;
                }
            }
        }
    }
    for idx in newly_unreachable {
        state.handlers[idx].unreachable = true;
    }
    Ok(())
}

fn resolve_inputs(store: &dyn Store, state: &ProcessState, idx: usize) -> Result<ActivityArgs, EngineError> {
    let inputs = state.handlers[idx].inputs.clone();
    let args = inputs.args.into_iter().map(|v| resolve_value(store, state, v)).collect::<Result<Vec<_>, _>>()?;
    let mut kwargs = HashMap::new();
    for (name, value) in inputs.kwargs {
        kwargs.insert(name, resolve_value(store, state, value)?);
    }
    Ok(ActivityArgs::new(args, kwargs))
}

fn resolve_value(store: &dyn Store, state: &ProcessState, value: ArgValue) -> Result<Value, EngineError> {
    match value {
        ArgValue::Literal(v) => Ok(v),
        ArgValue::FromHandler(h) => {
            let slot = &state.handlers[h.0];
            // `dependencies_satisfied` already confirmed this producer is
            // spawned and FINISHED before `idx` was allowed to spawn.
            let id = slot
                .activity_id
                .ok_or_else(|| EngineError::Uncategorized("data-flow predecessor was never spawned".into()))?;
            let child = store.get(id)?;
            let Some(outputs_id) = child.outputs else {
                return Ok(Value::Null);
            };
            let blob = store.get_blob(outputs_id)?;
            let outputs: modbpm_core::ActivityOutputs =
                modbpm_core::decompress(&blob).map_err(|e| EngineError::Store(e.to_string()))?;
            Ok(outputs.data.unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
