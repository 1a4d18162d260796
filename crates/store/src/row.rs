// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable row model: [`Activity`] and [`ActivityRelationship`] (spec §3).

use chrono::{DateTime, Utc};
use modbpm_core::{ActivityId, ActivityState, BlobId, IdentifierCode, StatusCode, TokenCode};
use serde::{Deserialize, Serialize};

/// A pending deferred-intent state (spec §3: `appointment`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Appointment {
    Suspended,
    Revoked,
}

impl Appointment {
    /// The state this appointment resolves to when applied (spec §4.2 step 2).
    pub fn target_state(self) -> ActivityState {
        match self {
            Appointment::Suspended => ActivityState::Suspended,
            Appointment::Revoked => ActivityState::Revoked,
        }
    }

    fn priority(self) -> u8 {
        self.target_state().priority()
    }
}

/// One row per activity instance (spec §3).
///
/// `token_code` is `None` once the row has been superseded by a concurrent
/// writer (spec I3) — a `None` token means the row is no longer writable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    /// Fully-qualified symbolic name of the backing class, immutable.
    pub name: String,
    pub identifier_code: IdentifierCode,
    pub token_code: Option<TokenCode>,
    pub inputs: Option<BlobId>,
    pub outputs: Option<BlobId>,
    pub snapshot: Option<BlobId>,
    pub state: ActivityState,
    pub appointment: Option<Appointment>,
    pub status_code: Option<StatusCode>,
    pub acknowledgment: u64,
    pub parent: Option<ActivityId>,
    pub date_created: DateTime<Utc>,
    pub date_archived: Option<DateTime<Utc>>,
    /// Number of times `_schedule()` has fired (spec §4.4 step 3). Not in
    /// the distilled data model; tracked here because the task scheduler
    /// contract references it directly.
    pub schedule_count: u64,
}

impl Activity {
    /// A freshly-inserted row: CREATED, live token, no archival fields set.
    pub fn new(
        id: ActivityId,
        name: impl Into<String>,
        parent: Option<ActivityId>,
        inputs: Option<BlobId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            identifier_code: IdentifierCode::new(),
            token_code: Some(TokenCode::new()),
            inputs,
            outputs: None,
            snapshot: None,
            state: ActivityState::Created,
            appointment: None,
            status_code: None,
            acknowledgment: 0,
            parent,
            date_created: now,
            date_archived: None,
            schedule_count: 0,
        }
    }

    /// The row is writable: it holds the live token for its `identifier_code`
    /// (spec I3).
    pub fn is_live(&self) -> bool {
        self.token_code.is_some()
    }
}

/// One edge of the ancestry tree's transitive closure (spec §3).
///
/// `distance` is always ≥ 1; `(ancestor, descendant)` and
/// `(descendant, distance)` are each unique, so every non-root activity has
/// exactly one row at `distance = 1` (spec I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityRelationship {
    pub ancestor: ActivityId,
    pub descendant: ActivityId,
    pub distance: u32,
}

/// Reconciles a pending appointment against a requested transition (spec
/// §4.2 step 2). Returns the effective target state and whether the
/// appointment should be consumed (cleared) as part of this transition.
pub(crate) fn reconcile_appointment(
    current: ActivityState,
    requested: ActivityState,
    appointment: Option<Appointment>,
) -> (ActivityState, bool) {
    let Some(appointment) = appointment else {
        return (requested, false);
    };

    if requested.is_archived() {
        // Consumed but ignored: the request wins, the appointment is dropped.
        return (requested, true);
    }

    let target_priority = requested.priority();
    if target_priority < appointment.priority()
        && modbpm_core::can_transit(current, appointment.target_state())
    {
        return (appointment.target_state(), true);
    }

    (requested, false)
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
