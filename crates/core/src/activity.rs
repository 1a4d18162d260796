// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity types for activities: the dense primary key, the stable
//! `identifier_code`, and the rotating `token_code` (spec §3).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Dense primary key assigned on insert, immutable thereafter (spec §3).
    pub struct ActivityId("act-");
}

crate::define_id! {
    /// Foreign key to an inputs, outputs, or snapshot blob row (spec §3).
    pub struct BlobId("blb-");
}

/// Stable 32-char opaque identifier, constant across retries of the same
/// logical activity (spec §3). Distinct from [`ActivityId`] — the latter is
/// the dense, ever-incrementing primary key; this is what external callers
/// (e.g. a retried job) use to recognize "the same logical activity".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierCode(String);

impl IdentifierCode {
    pub const LEN: usize = 32;

    /// Generate a fresh random identifier code.
    pub fn new() -> Self {
        Self(nanoid::nanoid!(Self::LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IdentifierCode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentifierCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdentifierCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 6-char random token, rotated on every successful transition; the CAS
/// witness for conditional row updates (spec §3, §4.2, §5).
///
/// A `None` token on a row means the row has been superseded and is no
/// longer writable (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCode(String);

impl TokenCode {
    pub const LEN: usize = 6;

    /// Generate a fresh random token, as done on every successful
    /// transition (spec §4.2 step 4).
    pub fn new() -> Self {
        Self(nanoid::nanoid!(Self::LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TokenCode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
