// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the end-to-end scenarios in spec.md §8: a handful of
//! small task/process classes and a drain-to-fixed-point helper around
//! `Engine`/`InMemoryJobQueue`.

use modbpm_core::{EngineConfig, EngineError, FakeClock};
use modbpm_queue::{Engine, InMemoryJobQueue};
use modbpm_runtime::outcome::StepOutcome;
use modbpm_runtime::process::{Process, ProcessCtx, ScheduleStrictness, SpawnArgs};
use modbpm_runtime::task::{Task, TaskCtx};
use modbpm_runtime::ActivityRegistry;
use modbpm_store::InMemoryStore;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

pub fn harness() -> (InMemoryStore<FakeClock>, InMemoryJobQueue, EngineConfig) {
    (InMemoryStore::new(FakeClock::default()), InMemoryJobQueue::new(), EngineConfig::default())
}

/// Runs every immediately-ready job to a fixed point. Delayed jobs (a
/// `lazy_transit` re-arm, a retried `acknowledge`) are left in the queue —
/// scenarios that care about them drain `queue.drain_delayed()` explicitly.
pub fn drain(engine: &Engine<'_>, queue: &InMemoryJobQueue) {
    for _ in 0..1000 {
        let Some(job) = queue.pop_ready() else { return };
        engine.drain_one(job).unwrap();
    }
    panic!("drain exceeded 1000 jobs — likely runaway loop");
}

/// Fires every currently-delayed job (treating "enough wall-clock time
/// passed" as already true, the way `InMemoryJobQueue::drain_delayed`
/// documents) and drains whatever that newly makes ready.
pub fn advance_delayed(engine: &Engine<'_>, queue: &InMemoryJobQueue) {
    for job in queue.drain_delayed() {
        engine.drain_one(job).unwrap();
    }
    drain(engine, queue);
}

/// An append-only record of `start:<tag>`/`finish:<tag>` events, shared
/// between a fixture's registry closure and every instance it constructs —
/// `schedule`/`initiate` reconstruct a fresh `Task`/`Process` from the
/// registry on every job, so ordering can't be observed through instance
/// fields and has to live outside them (spec §9: no state survives a job
/// boundary except the snapshot).
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// A leaf that finishes synchronously in `on_start` with the given payload,
/// logging `start:<tag>` and `finish:<tag>` in the same call.
pub struct LoggingImmediate {
    pub log: Log,
    pub tag: &'static str,
    pub payload: serde_json::Value,
}
impl Task for LoggingImmediate {
    fn on_start(&mut self, _ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        self.log.lock().push(format!("start:{}", self.tag));
        self.log.lock().push(format!("finish:{}", self.tag));
        Ok(StepOutcome::finished(self.payload.clone()))
    }
}

/// A leaf that fails synchronously in `on_start`, logging `start:<tag>` and
/// `fail:<tag>`.
pub struct LoggingFails {
    pub log: Log,
    pub tag: &'static str,
    pub status_code: i32,
}
impl Task for LoggingFails {
    fn on_start(&mut self, _ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        self.log.lock().push(format!("start:{}", self.tag));
        self.log.lock().push(format!("fail:{}", self.tag));
        Ok(StepOutcome::failed(self.status_code, json!("boom")))
    }
}

/// A long-running leaf that polls on a 1-second static interval and finishes
/// once `TaskCtx::schedule_count()` reaches `finish_after` (spec §8 scenario
/// 2's `ProvideOffice`: "a polling task, finishes after 3 schedules"). Counts
/// against the durable `TaskState` the engine carries across job boundaries
/// rather than an instance field — `schedule`/`initiate` reconstruct a fresh
/// `Task` from the registry on every job (spec §9), so an instance counter
/// would silently reset every time.
pub struct LoggingPoll {
    pub log: Log,
    pub tag: &'static str,
    pub finish_after: u64,
}
impl Task for LoggingPoll {
    fn on_start(&mut self, ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        self.log.lock().push(format!("start:{}", self.tag));
        ctx.set_static_scheduler(1);
        Ok(StepOutcome::Continue)
    }

    fn on_schedule(&mut self, ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        if ctx.schedule_count() >= self.finish_after {
            self.log.lock().push(format!("finish:{}", self.tag));
            Ok(StepOutcome::finished(json!("ready")))
        } else {
            self.log.lock().push(format!("schedule:{}", self.tag));
            Ok(StepOutcome::Continue)
        }
    }
}

/// Builds a registry with every class these scenarios spawn by name, all
/// sharing `log` so a test can assert on cross-activity ordering.
pub fn registry(log: &Log) -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    let l = log.clone();
    registry.register_task("pkg.A", move || LoggingImmediate { log: l.clone(), tag: "a", payload: json!("a") });
    let l = log.clone();
    registry.register_task("pkg.B", move || LoggingImmediate { log: l.clone(), tag: "b", payload: json!("b") });
    let l = log.clone();
    registry.register_task("pkg.Register", move || LoggingImmediate {
        log: l.clone(),
        tag: "register",
        payload: json!("registered"),
    });
    let l = log.clone();
    registry.register_task("pkg.HealthCheckUp", move || LoggingImmediate {
        log: l.clone(),
        tag: "healthcheck",
        payload: json!("healthy"),
    });
    let l = log.clone();
    registry.register_task("pkg.ProvideComputer", move || LoggingImmediate {
        log: l.clone(),
        tag: "computer",
        payload: json!("computer"),
    });
    let l = log.clone();
    registry.register_task("pkg.ProvideOffice", move || LoggingPoll { log: l.clone(), tag: "office", finish_after: 3 });
    let l = log.clone();
    registry.register_task("pkg.FailedTask", move || LoggingFails { log: l.clone(), tag: "failed", status_code: 1 });
    registry.register_process("pkg.SerialChain", || SerialChainProcess);
    registry.register_process("pkg.Diamond", || DiamondProcess);
    registry.register_process("pkg.LooseTriple", || LooseTripleProcess);
    registry.register_process("pkg.StrictTriple", || StrictTripleProcess);
    registry
}

/// Scenario 1 (spec §8): `B` must not spawn until `A` has finished.
pub struct SerialChainProcess;
impl Process for SerialChainProcess {
    fn on_start(&mut self, ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError> {
        let a = ctx.start("pkg.A", &[], SpawnArgs::new());
        ctx.start("pkg.B", &[a], SpawnArgs::new());
        Ok(())
    }
}

/// Scenario 2 (spec §8): `hrdb` runs first (serial), `office`/`healthcheck`
/// run in parallel once `hrdb` finishes, `computer` waits for both `hrdb`
/// and `office`.
pub struct DiamondProcess;
impl Process for DiamondProcess {
    fn on_start(&mut self, ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError> {
        let hrdb = ctx.start("pkg.Register", &[], SpawnArgs::new());
        // `hrdb`'s serial spawn already left an implicit ordering checkpoint
        // that every later spawn inherits (spec §4.5), so `office` doesn't
        // need `hrdb` listed as an explicit predecessor.
        let office = ctx.run_in_parallel(|ctx| ctx.start("pkg.ProvideOffice", &[], SpawnArgs::new()));
        ctx.run_in_parallel(|ctx| {
            ctx.start("pkg.ProvideComputer", &[hrdb, office], SpawnArgs::new());
            ctx.start("pkg.HealthCheckUp", &[hrdb], SpawnArgs::new());
        });
        Ok(())
    }
}

/// Scenario 3 (spec §8): the same serial chain as [`StrictTripleProcess`],
/// but under the loose mixin the failed middle child doesn't block the
/// third spawn — only `required_state_for` differs between the two.
pub struct LooseTripleProcess;
impl Process for LooseTripleProcess {
    fn on_start(&mut self, ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError> {
        ctx.start("pkg.Register", &[], SpawnArgs::new());
        ctx.start("pkg.FailedTask", &[], SpawnArgs::new());
        ctx.start("pkg.Register", &[], SpawnArgs::new());
        Ok(())
    }

    fn strictness(&self) -> ScheduleStrictness {
        ScheduleStrictness::Loose
    }
}

/// Scenario 4 (spec §8): one child fails, the process fails fast and never
/// spawns the remainder.
pub struct StrictTripleProcess;
impl Process for StrictTripleProcess {
    fn on_start(&mut self, ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError> {
        ctx.start("pkg.Register", &[], SpawnArgs::new());
        ctx.start("pkg.FailedTask", &[], SpawnArgs::new());
        ctx.start("pkg.Register", &[], SpawnArgs::new());
        Ok(())
    }

    fn strictness(&self) -> ScheduleStrictness {
        ScheduleStrictness::Strict
    }
}
