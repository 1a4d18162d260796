// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The class registry: replaces dynamic by-name class lookup (spec §9's
//! "dynamic class lookup by fully-qualified name" redesign note) with an
//! explicit `name -> constructor` map populated by the embedding
//! application at startup.

use crate::process::{Process, ProcessState};
use crate::task::{Task, TaskState};
use modbpm_core::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Either flavor of runtime object a registered class constructs (spec §2:
/// "Task (leaf)" vs "Process (composite)").
pub enum Runtime {
    Task(Box<dyn Task>),
    Process(Box<dyn Process>),
}

/// The serializable half of a [`Runtime`] (spec §3 `snapshot`): the part
/// that actually crosses a job boundary. `modbpm-queue` compresses this into
/// the activity row's `snapshot` blob after `initiate`/`schedule` and
/// decompresses it back before the next `schedule` call, reconstructing a
/// fresh `Runtime` object from the registry each time (Design Notes §9 —
/// there is no pickled micro-thread stack, only this).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuntimeSnapshot {
    Task(TaskState),
    Process(ProcessState),
}

type Constructor = Box<dyn Fn() -> Runtime + Send + Sync>;

/// Maps an activity row's `name` (spec §3: "fully-qualified symbolic name
/// of the backing class") to a constructor for its runtime object.
///
/// A lookup miss is the "import failure" case of spec §7
/// (`EngineError::UnknownClass`, `StatusCode::IMPORT_FAILURE`) — there is no
/// dynamic loading to fail differently, so import and "class not found" are
/// the same failure here.
#[derive(Default)]
pub struct ActivityRegistry {
    constructors: HashMap<&'static str, Constructor>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_task<F, T>(&mut self, name: &'static str, make: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Task + 'static,
    {
        self.constructors.insert(name, Box::new(move || Runtime::Task(Box::new(make()))));
    }

    pub fn register_process<F, P>(&mut self, name: &'static str, make: F)
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Process + 'static,
    {
        self.constructors.insert(name, Box::new(move || Runtime::Process(Box::new(make()))));
    }

    /// Construct a fresh runtime object for `name` (spec §4.6 `initiate`'s
    /// "import stage"). The instance itself never crosses a job boundary —
    /// only the serializable `TaskState`/`ProcessState` snapshot does.
    pub fn construct(&self, name: &str) -> Result<Runtime, EngineError> {
        let ctor = self
            .constructors
            .get(name)
            .ok_or_else(|| EngineError::UnknownClass { class_name: name.to_string() })?;
        Ok(ctor())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
