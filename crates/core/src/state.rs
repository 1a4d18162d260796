// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The activity state algebra: the closed set of states, the transition
//! graph, and the priority total order used to reconcile appointments.
//!
//! This module has no runtime state of its own — every function here is a
//! pure lookup against the constant tables in spec.md §6.

use serde::{Deserialize, Serialize};

/// The closed set of activity states (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Created,
    Ready,
    Running,
    Blocked,
    Suspended,
    Finished,
    Failed,
    Revoked,
}

crate::simple_display! {
    ActivityState {
        Created => "created",
        Ready => "ready",
        Running => "running",
        Blocked => "blocked",
        Suspended => "suspended",
        Finished => "finished",
        Failed => "failed",
        Revoked => "revoked",
    }
}

impl ActivityState {
    /// States a `_transit` call may target directly (spec §6).
    pub fn is_transitable_target(self) -> bool {
        matches!(self, Self::Ready | Self::Running | Self::Blocked | Self::Finished | Self::Failed)
    }

    /// States only reachable as an appointment outcome (spec §6).
    pub fn is_appointable(self) -> bool {
        matches!(self, Self::Suspended | Self::Revoked)
    }

    /// Terminal states; a row in one of these is immutable (spec §3 I1, I2).
    pub fn is_archived(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Revoked)
    }

    /// Legal successors of this state (spec §6 transition table).
    pub fn successors(self) -> &'static [ActivityState] {
        use ActivityState::*;
        match self {
            Created => &[Ready, Failed, Revoked],
            Ready => &[Running, Revoked, Suspended],
            Running => &[Blocked, Finished, Failed],
            Blocked => &[Ready, Revoked, Failed],
            Suspended => &[Ready, Revoked],
            Finished | Failed | Revoked => &[],
        }
    }

    /// Priority rank used only to reconcile a pending appointment against a
    /// requested transition (spec §3 I5). Lower is less urgent.
    pub fn priority(self) -> u8 {
        use ActivityState::*;
        match self {
            Created => 0,
            Ready | Running | Blocked => 1,
            Suspended => 7,
            Revoked => 8,
            Finished | Failed => 9,
        }
    }
}

/// `can_transit(from, to)` — membership in `from`'s successor set (spec §4.1).
pub fn can_transit(from: ActivityState, to: ActivityState) -> bool {
    from.successors().contains(&to)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
