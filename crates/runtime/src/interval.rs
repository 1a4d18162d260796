// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three named interval generators a [`crate::task::Task`] may install
//! via `set_scheduler`/`set_default_scheduler`/`set_static_scheduler`/
//! `set_null_scheduler` (spec §4.4).
//!
//! Per Design Notes §9, the runtime object is no longer a pickled stack —
//! it is reconstructed fresh on every job and driven by an explicit,
//! serializable [`crate::task::TaskState`] snapshot. A generator therefore
//! can't be an arbitrary user closure (nothing to serialize across the job
//! boundary); the three generators spec.md names are carried as plain enum
//! variants instead of trait objects.

use modbpm_core::EngineConfig;
use serde::{Deserialize, Serialize};

/// Which generator a task installed, plus whatever counter state it needs
/// to produce its next interval (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalKind {
    /// `1², 2², 3², …` seconds. `step` is the count of intervals already
    /// handed out.
    Quadratic { step: u64 },
    /// A constant `n`-second interval.
    Static { secs: u64 },
    /// Always returns `None` — hands control to an external callback
    /// (spec §4.4, resolved per Design Notes §9's open question: `None`
    /// means "stop scheduling", the only reading consistent with
    /// `set_null_scheduler`'s documented purpose).
    Null,
}

impl IntervalKind {
    pub fn default_scheduler() -> Self {
        IntervalKind::Quadratic { step: 0 }
    }

    pub fn static_scheduler(secs: u64) -> Self {
        IntervalKind::Static { secs }
    }

    pub fn null_scheduler() -> Self {
        IntervalKind::Null
    }

    /// Advance the generator and return the next *clamped* interval, or
    /// `None` if scheduling should stop (spec §4.4 step 4: "clamps it to
    /// `[MODBPM_MIN_SCHEDULE_INTERVAL, MODBPM_MAX_SCHEDULE_INTERVAL]`").
    pub fn next(&mut self, config: &EngineConfig) -> Option<u64> {
        match self {
            IntervalKind::Quadratic { step } => {
                *step += 1;
                Some(config.clamp_interval(*step * *step))
            }
            IntervalKind::Static { secs } => Some(config.clamp_interval(*secs)),
            IntervalKind::Null => None,
        }
    }
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
