// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 3 (spec §8): a loose process attempts every child despite one
//! of them failing, and still archives FINISHED.

use crate::support::*;
use modbpm_core::{ActivityArgs, ActivityState};
use modbpm_queue::Engine;

#[test]
fn loose_process_attempts_every_child_despite_a_failure() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    let root = engine.start("pkg.LooseTriple", ActivityArgs::default()).unwrap();
    drain(&engine, &queue);

    let events = log.lock().clone();
    assert_eq!(events.iter().filter(|e| e.as_str() == "start:register").count(), 2, "both Register children ran");
    assert!(events.contains(&"fail:failed".to_string()), "the middle child failed");

    let row = store.get(root).unwrap();
    assert_eq!(row.state, ActivityState::Finished, "the process still archives FINISHED despite the failure");
    assert!(store.descendants(root).unwrap().is_empty());
}
