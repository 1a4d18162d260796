// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! modbpm-store: the durable row model and the `_transit`/`_appoint`/
//! `_lazy_transit` primitives that are the only path by which an activity's
//! state may change.

pub mod row;
pub mod store;
pub mod transit;

pub use row::{Activity, ActivityRelationship, Appointment};
pub use store::{DynStore, InMemoryStore, Store};
pub use transit::{lazy_transit, TransitOutcome, TransitPatch};
