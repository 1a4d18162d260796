// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 4 (spec §8): a strict process fails fast on the first
//! non-FINISHED child and never spawns the remainder.

use crate::support::*;
use modbpm_core::{ActivityArgs, ActivityState, StatusCode};
use modbpm_queue::Engine;

#[test]
fn strict_process_fails_fast_and_never_spawns_the_remainder() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    let root = engine.start("pkg.StrictTriple", ActivityArgs::default()).unwrap();
    drain(&engine, &queue);

    let events = log.lock().clone();
    assert_eq!(events.iter().filter(|e| e.as_str() == "start:register").count(), 1, "only the first Register ran");
    assert!(events.contains(&"fail:failed".to_string()));

    let row = store.get(root).unwrap();
    assert_eq!(row.state, ActivityState::Failed);
    assert_eq!(row.status_code, Some(StatusCode(1)));
}
