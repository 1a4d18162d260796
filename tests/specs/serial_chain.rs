// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 1 (spec §8): `P` spawns `A`, then `B` with `predecessors=[A]`.

use crate::support::*;
use modbpm_core::{ActivityArgs, ActivityState};
use modbpm_queue::Engine;

#[test]
fn serial_chain_runs_a_to_completion_before_b_ever_starts() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    let root = engine.start("pkg.SerialChain", ActivityArgs::default()).unwrap();
    drain(&engine, &queue);

    let row = store.get(root).unwrap();
    assert_eq!(row.state, ActivityState::Finished, "P archives FINISHED implicitly");

    let events = log.lock().clone();
    assert_eq!(events, vec!["start:a", "finish:a", "start:b", "finish:b"], "A finished before B ever started");

    let children = store.descendants(root).unwrap();
    assert!(children.is_empty(), "both children archived, none remain as live descendants");
}
