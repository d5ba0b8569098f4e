// src/engine/mod.rs

//! Run engine for pipedag.
//!
//! This module ties together:
//! - the pure per-run state machine ([`core`]) that decides which tasks are
//!   ready, which are skipped, and when the run is finished
//! - the async IO shell ([`runtime`]) that reads completion events from a
//!   channel, records results, and dispatches ready tasks to the executor
//!
//! The core is deterministic and has no channels, Tokio types, or IO, so it
//! can be unit tested by stepping it by hand.

use std::time::SystemTime;

use crate::retry::RetryPolicy;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task's attempt loop, as reported by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed { exit_code: i32, detail: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Description of a task the engine wants the executor to run now.
#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub name: TaskName,
    pub cmd: String,
    pub pool: Option<String>,
    pub retry: Option<RetryPolicy>,
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A task's attempt loop finished with a terminal outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
        attempts: u32,
        started_at: SystemTime,
        finished_at: SystemTime,
    },
    /// Abort the run between tasks (e.g. Ctrl-C): not-yet-started tasks
    /// are recorded as skipped, running tasks finish normally.
    AbortRequested,
}

pub mod core;
pub mod runtime;

pub use core::{CoreRun, CoreStep};
pub use runtime::Runtime;
