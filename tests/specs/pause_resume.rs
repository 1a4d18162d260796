// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 5 (spec §8): `pause()` sets a pending SUSPENDED appointment;
//! it intercepts the activity's next READY -> RUNNING attempt (the only
//! edge SUSPENDED is directly reachable from, spec §6) rather than whatever
//! transition happens to be in flight when `pause()` is called. `resume()`
//! then transits straight back to READY and the activity proceeds.

use crate::support::*;
use modbpm_core::{ActivityArgs, ActivityState};
use modbpm_queue::Engine;
use modbpm_store::Appointment;

#[test]
fn pause_suspends_on_the_next_ready_to_running_attempt_and_resume_lets_it_proceed() {
    let (store, queue, config) = harness();
    let log = new_log();
    let registry = registry(&log);
    let engine = Engine::new(&store, &queue, &registry, &config);

    let id = engine.start("pkg.ProvideOffice", ActivityArgs::default()).unwrap();
    drain(&engine, &queue);
    assert_eq!(store.get(id).unwrap().state, ActivityState::Blocked, "one polling cycle ran and re-armed");

    // pause(): `_appoint(SUSPENDED)` on this (childless) subtree root.
    store.appoint(id, Appointment::Suspended).unwrap();

    // The pending lazy_transit still lands the row on READY normally
    // (BLOCKED -> SUSPENDED isn't a legal edge), but the very next
    // transition it attempts — this `schedule` job's READY -> RUNNING —
    // gets intercepted and promoted to SUSPENDED instead.
    advance_delayed(&engine, &queue);
    let row = store.get(id).unwrap();
    assert_eq!(row.state, ActivityState::Suspended);
    assert!(row.appointment.is_none(), "the appointment was consumed by the override");

    // resume(): transits straight to READY.
    engine.transit(id, ActivityState::Ready).unwrap();
    assert_eq!(store.get(id).unwrap().state, ActivityState::Ready);

    drain(&engine, &queue);
    assert_eq!(store.get(id).unwrap().state, ActivityState::Blocked, "polling resumed as normal");
    advance_delayed(&engine, &queue);

    let row = store.get(id).unwrap();
    assert_eq!(row.state, ActivityState::Finished, "the activity proceeds to completion after resume");
    assert!(log.lock().contains(&"finish:office".to_string()));
}
