// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! modbpm-queue: the four job-queue entry points (spec §4.6), the
//! signal→job wiring table, and the `JobQueue` trait every engine instance
//! is built against. This is the event-driven dispatch loop (spec §2
//! component 3) that makes the workflow long-running and recoverable.

pub mod engine;
pub mod jobqueue;
pub mod router;

pub use engine::Engine;
pub use jobqueue::{InMemoryJobQueue, Job, JobQueue};
pub use router::SignalRouter;
