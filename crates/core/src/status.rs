// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status codes attached to archived activities (spec §3, §7).

use serde::{Deserialize, Serialize};

/// Outcome classification set on an activity at archival.
///
/// `0` is success, user classes are any other positive value the activity's
/// own code chooses to raise, and the engine reserves a handful of values
/// for its own failure taxonomy (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    /// Import/uncategorized failure: the named class could not be loaded.
    pub const IMPORT_FAILURE: StatusCode = StatusCode(1);
    /// Constructor raised while instantiating the runtime object.
    pub const INSTANTIATION_FAILURE: StatusCode = StatusCode(2);
    /// Anything raised from `_initiate`/`_resume`/`_schedule`/`_destroy`.
    pub const RUNTIME_FAILURE: StatusCode = StatusCode(3);
    /// Soft job-time-limit exceeded (spec §7, §9).
    pub const TIMEOUT: StatusCode = StatusCode(100);
    /// Anything else reaching the global exception handler.
    pub const UNCATEGORIZED: StatusCode = StatusCode(255);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// A `status_code` of 0 archives as FINISHED, anything else as FAILED
    /// (spec §3, `finish()` contract in §4.3).
    pub fn is_failure(self) -> bool {
        !self.is_success()
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for StatusCode {
    fn from(v: i32) -> Self {
        StatusCode(v)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
