// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::outcome::StepOutcome;
use crate::process::{ProcessCtx, ScheduleStrictness, SpawnMode};
use crate::task::TaskCtx;

struct EchoTask;
impl Task for EchoTask {
    fn on_start(&mut self, _ctx: &mut TaskCtx<'_>) -> Result<StepOutcome, EngineError> {
        Ok(StepOutcome::finished(None))
    }
}

struct EmptyProcess;
impl crate::process::Process for EmptyProcess {
    fn on_start(&mut self, _ctx: &mut ProcessCtx<'_>) -> Result<(), EngineError> {
        Ok(())
    }
}

#[test]
fn registered_task_class_constructs_a_task() {
    let mut registry = ActivityRegistry::new();
    registry.register_task("pkg.Echo", || EchoTask);
    match registry.construct("pkg.Echo").unwrap() {
        Runtime::Task(_) => {}
        Runtime::Process(_) => panic!("expected a Task"),
    }
}

#[test]
fn registered_process_class_constructs_a_process() {
    let mut registry = ActivityRegistry::new();
    registry.register_process("pkg.Empty", || EmptyProcess);
    match registry.construct("pkg.Empty").unwrap() {
        Runtime::Process(_) => {}
        Runtime::Task(_) => panic!("expected a Process"),
    }
}

#[test]
fn unknown_class_name_is_an_unknown_class_error() {
    let registry = ActivityRegistry::new();
    match registry.construct("pkg.Nope") {
        Err(EngineError::UnknownClass { class_name }) => assert_eq!(class_name, "pkg.Nope"),
        Err(other) => panic!("expected UnknownClass, got {other:?}"),
        Ok(_) => panic!("expected a lookup failure"),
    }
}

#[test]
fn process_default_mode_and_strictness_are_readable_through_the_trait_object() {
    let registry_process = EmptyProcess;
    assert_eq!(registry_process.default_mode(), SpawnMode::Serial);
    assert_eq!(registry_process.strictness(), ScheduleStrictness::Default);
}
