// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's single error taxonomy (spec §7).
//!
//! Every fallible operation in `modbpm-store`, `modbpm-runtime`, and
//! `modbpm-queue` returns [`EngineError`]. `modbpm-queue`'s global exception
//! handler (spec §4.6) is the only place that turns one of these into a
//! `StatusCode` and archives the offending activity.

use crate::activity::ActivityId;
use crate::state::ActivityState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The named activity class could not be resolved in the registry
    /// (spec §7, `StatusCode::IMPORT_FAILURE`).
    #[error("unknown activity class {class_name:?}")]
    UnknownClass { class_name: String },

    /// The runtime object's constructor raised (spec §7,
    /// `StatusCode::INSTANTIATION_FAILURE`).
    #[error("failed to instantiate activity {id}: {source}")]
    InstantiationFailure {
        id: ActivityId,
        #[source]
        source: anyhow_like::BoxError,
    },

    /// `_initiate`/`_resume`/`_schedule`/`_destroy` raised (spec §7,
    /// `StatusCode::RUNTIME_FAILURE`).
    #[error("activity {id} raised during {phase}: {source}")]
    RuntimeFailure {
        id: ActivityId,
        phase: &'static str,
        #[source]
        source: anyhow_like::BoxError,
    },

    /// A task's soft time limit elapsed mid-step (spec §7, §9;
    /// `StatusCode::TIMEOUT`).
    #[error("activity {id} exceeded its soft time limit")]
    Timeout { id: ActivityId },

    /// `_transit` was asked for an illegal edge (spec §4.1 I3).
    #[error("activity {id} cannot transition {from} -> {to}")]
    IllegalTransition { id: ActivityId, from: ActivityState, to: ActivityState },

    /// The conditional update's token guard did not match: a concurrent
    /// writer won the race (spec §3, §4.2 step 2).
    #[error("activity {id} token mismatch — row was concurrently modified")]
    TokenMismatch { id: ActivityId },

    /// Referenced row does not exist.
    #[error("activity {id} not found")]
    NotFound { id: ActivityId },

    /// Underlying [`Store`](crate) implementation failed (I/O, serialization).
    #[error("store operation failed: {0}")]
    Store(String),

    /// Anything else, caught by the global exception handler (spec §4.6;
    /// `StatusCode::UNCATEGORIZED`).
    #[error("uncategorized failure: {0}")]
    Uncategorized(String),
}

impl EngineError {
    /// True for the "internal invariant violation" class (spec §7): a
    /// missing row, a forbidden appointment target, a transition to a
    /// non-transitable state. These abort the current job unchanged rather
    /// than being caught and archived by `global_exception_handler` — the
    /// job-queue's own retry policy takes over.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::IllegalTransition { .. }
                | EngineError::TokenMismatch { .. }
                | EngineError::NotFound { .. }
        )
    }

    /// The `StatusCode` the global exception handler archives an activity
    /// with when this error escapes a job (spec §7).
    pub fn status_code(&self) -> crate::status::StatusCode {
        use crate::status::StatusCode;
        match self {
            EngineError::UnknownClass { .. } => StatusCode::IMPORT_FAILURE,
            EngineError::InstantiationFailure { .. } => StatusCode::INSTANTIATION_FAILURE,
            EngineError::RuntimeFailure { .. } => StatusCode::RUNTIME_FAILURE,
            EngineError::Timeout { .. } => StatusCode::TIMEOUT,
            EngineError::IllegalTransition { .. }
            | EngineError::TokenMismatch { .. }
            | EngineError::NotFound { .. }
            | EngineError::Store(_)
            | EngineError::Uncategorized(_) => StatusCode::UNCATEGORIZED,
        }
    }
}

/// A minimal boxed-error alias so `EngineError` doesn't pull in a generic
/// anyhow dependency just to carry an opaque user-code failure.
pub mod anyhow_like {
    pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
