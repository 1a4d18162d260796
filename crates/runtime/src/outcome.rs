// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The redesigned replacement for `Finished`/`Failed` control-flow
//! exceptions (spec §4.3, Design Notes §9): a plain tagged return value.
//!
//! `on_start`/`on_schedule` return a [`StepOutcome`] instead of raising —
//! `Continue` means the activity stays alive (a process keeps waiting on
//! children, a task keeps polling), `Archive` means "finish me now" with
//! `status_code == 0` archiving as FINISHED and anything else as FAILED
//! (spec §3, §4.3's `finish()` contract).

use modbpm_core::{ActivityOutputs, StatusCode};

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue,
    Archive { status_code: StatusCode, outputs: ActivityOutputs },
}

impl StepOutcome {
    pub fn finished(data: impl Into<Option<serde_json::Value>>) -> Self {
        StepOutcome::Archive {
            status_code: StatusCode::SUCCESS,
            outputs: ActivityOutputs::new(data.into(), None),
        }
    }

    pub fn failed(status_code: impl Into<StatusCode>, ex_data: impl Into<Option<serde_json::Value>>) -> Self {
        let status_code = status_code.into();
        debug_assert!(status_code.is_failure(), "failed() called with a success status code");
        StepOutcome::Archive { status_code, outputs: ActivityOutputs::new(None, ex_data.into()) }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, StepOutcome::Archive { .. })
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
