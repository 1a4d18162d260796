// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 6 (spec §8): a child finishes while its parent is RUNNING (not
//! transitable to READY yet); the immediate wake fails and a delayed
//! `acknowledge` retries it once the parent returns to a transitable state.

use crate::support::*;
use modbpm_core::ActivityState;
use modbpm_queue::{Engine, Job};
use modbpm_store::TransitPatch;

#[test]
fn a_failed_wake_up_retries_via_acknowledge_once_the_parent_is_transitable_again() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    // A hand-built parent/child pair standing in for a process mid-`schedule`
    // call: the parent is RUNNING (busy inside its own `schedule_step`) when
    // the child, spawned earlier, finishes on its own job.
    let parent = store.insert_activity("pkg.Parent", None, None).unwrap();
    store.transit(parent.id, ActivityState::Ready, TransitPatch::default()).unwrap();
    store.transit(parent.id, ActivityState::Running, TransitPatch::default()).unwrap();

    let child = store.insert_activity("pkg.A", Some(parent.id), None).unwrap();
    engine.initiate(child.id).unwrap();
    drain(&engine, &queue);

    let row = store.get(child.id).unwrap();
    assert_eq!(row.state, ActivityState::Finished, "A finishes synchronously in on_start");
    assert_eq!(row.acknowledgment, 0, "the wake-up failed because the parent was RUNNING");

    let delayed = queue.drain_delayed();
    assert_eq!(delayed, vec![Job::Acknowledge { id: child.id }]);

    // The parent finishes its own `schedule` and parks in BLOCKED, a
    // transitable state again.
    store.transit(parent.id, ActivityState::Blocked, TransitPatch::default()).unwrap();

    engine.drain_one(delayed[0]).unwrap();

    assert_eq!(store.get(parent.id).unwrap().state, ActivityState::Ready, "the retried wake-up succeeded");
    assert_eq!(store.get(child.id).unwrap().acknowledgment, 1);
}
