// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 2 (spec §8): `hrdb`/`office` (parallel once `hrdb` finishes)
//! feed into `computer`, while `healthcheck` only needs `hrdb`.

use crate::support::*;
use modbpm_core::{ActivityArgs, ActivityState};
use modbpm_queue::Engine;

#[test]
fn computer_waits_for_both_predecessors_while_healthcheck_interleaves_with_office() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    let root = engine.start("pkg.Diamond", ActivityArgs::default()).unwrap();
    drain(&engine, &queue);

    // `office` polls on a 1s static interval and hasn't finished its 3
    // schedules yet, so `computer` — which needs both `hrdb` and `office`
    // FINISHED — must not have started.
    let events = log.lock().clone();
    assert!(events.contains(&"finish:hrdb".to_string()));
    assert!(events.contains(&"finish:healthcheck".to_string()));
    assert!(events.contains(&"start:office".to_string()));
    assert!(!events.contains(&"start:computer".to_string()), "computer must wait for office to finish");

    // `healthcheck` only depends on `hrdb`, so it ran without waiting on
    // `office`'s polling cycles.
    let office_finish = events.iter().position(|e| e == "finish:office");
    assert!(office_finish.is_none(), "office has not finished its 3 schedules yet");
    assert!(events.iter().any(|e| e == "finish:healthcheck"));

    advance_delayed(&engine, &queue);
    advance_delayed(&engine, &queue);

    let events = log.lock().clone();
    assert!(events.contains(&"finish:office".to_string()));
    assert!(events.contains(&"start:computer".to_string()), "computer starts once both predecessors finished");
    let computer_start = events.iter().position(|e| e == "start:computer").unwrap();
    let office_finish = events.iter().position(|e| e == "finish:office").unwrap();
    let hrdb_finish = events.iter().position(|e| e == "finish:hrdb").unwrap();
    assert!(computer_start > office_finish && computer_start > hrdb_finish);

    let row = store.get(root).unwrap();
    assert_eq!(row.state, ActivityState::Finished);
    assert!(store.descendants(root).unwrap().is_empty());
}
