// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide tunables (spec §7, §9's resolved Open Questions).
//!
//! `EngineConfig` is constructed once at process startup, typically from
//! environment variables (`MODBPM_*`) with the defaults below as fallback,
//! and threaded by reference into `modbpm-runtime` and `modbpm-queue`.

use serde::{Deserialize, Serialize};

/// Lower bound on a task's re-arm interval (spec §7). An
/// [`crate::error::EngineError`] is raised if a custom `IntervalGenerator`
/// returns below this.
pub const DEFAULT_MIN_SCHEDULE_INTERVAL_SECS: u64 = 1;

/// Upper bound on a task's re-arm interval (spec §7); the quadratic backoff
/// generator saturates here rather than growing unbounded.
pub const DEFAULT_MAX_SCHEDULE_INTERVAL_SECS: u64 = 3600;

/// Countdown before the first `acknowledge` retry of a still-archived-less
/// activity is enqueued (spec §4.6, §9 — retries are unbounded by design,
/// carried over from the original's documented limitation).
pub const DEFAULT_ACKNOWLEDGE_COUNTDOWN_SECS: u64 = 5;

/// Default zlib compression level applied to input/output/snapshot blobs
/// (spec §6: "zlib-compressed ... level 6").
pub const DEFAULT_BLOB_COMPRESSION_LEVEL: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    min_schedule_interval_secs: u64,
    max_schedule_interval_secs: u64,
    acknowledge_countdown_secs: u64,
    blob_compression_level: u32,
}

impl EngineConfig {
    pub fn min_schedule_interval_secs(&self) -> u64 {
        self.min_schedule_interval_secs
    }

    pub fn max_schedule_interval_secs(&self) -> u64 {
        self.max_schedule_interval_secs
    }

    pub fn acknowledge_countdown_secs(&self) -> u64 {
        self.acknowledge_countdown_secs
    }

    pub fn blob_compression_level(&self) -> u32 {
        self.blob_compression_level
    }

    /// Clamp a requested interval into `[min, max]` (spec §7's interval
    /// generator contract).
    pub fn clamp_interval(&self, requested_secs: u64) -> u64 {
        requested_secs.clamp(self.min_schedule_interval_secs, self.max_schedule_interval_secs)
    }

    crate::setters! {
        set {
            min_schedule_interval_secs: u64,
            max_schedule_interval_secs: u64,
            acknowledge_countdown_secs: u64,
            blob_compression_level: u32,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_schedule_interval_secs: DEFAULT_MIN_SCHEDULE_INTERVAL_SECS,
            max_schedule_interval_secs: DEFAULT_MAX_SCHEDULE_INTERVAL_SECS,
            acknowledge_countdown_secs: DEFAULT_ACKNOWLEDGE_COUNTDOWN_SECS,
            blob_compression_level: DEFAULT_BLOB_COMPRESSION_LEVEL,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
