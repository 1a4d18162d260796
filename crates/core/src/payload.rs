// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two payload shapes carried by blob rows (spec §3): an activity's
//! `(args, kwargs)` inputs and its `(data, ex_data)` outputs. Both are
//! opaque to the engine — compressed and stored via [`crate::blob`], never
//! inspected outside user code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An activity's positional/keyword arguments, as passed to `self.start(...)`
/// or to the root activity at process-start time (spec §3 `inputs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityArgs {
    pub args: Vec<Value>,
    pub kwargs: HashMap<String, Value>,
}

impl ActivityArgs {
    pub fn new(args: Vec<Value>, kwargs: HashMap<String, Value>) -> Self {
        Self { args, kwargs }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

/// An archived activity's outputs (spec §3 `outputs`): `data` on success,
/// `ex_data` carrying failure detail (e.g. a trace) on failure. Both are
/// optional — a `finish()` call may supply neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutputs {
    pub data: Option<Value>,
    pub ex_data: Option<Value>,
}

impl ActivityOutputs {
    pub fn new(data: Option<Value>, ex_data: Option<Value>) -> Self {
        Self { data, ex_data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.ex_data.is_none()
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
