// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`super::executor_loop`].
//!
//! - `CommandExecutorBackend` is the default implementation. It forwards
//!   dispatched tasks over an mpsc channel to the background executor loop,
//!   which spawns real shell processes.
//! - Tests can provide their own `ExecutorBackend` that, for example,
//!   records which tasks were dispatched and directly emits `TaskCompleted`
//!   events with scripted outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{DispatchTask, RunEvent};
use crate::errors::{Error, Result};
use crate::exec::executor_loop::spawn_executor;
use crate::exec::pools::PoolManager;

/// Trait abstracting how dispatched tasks are executed.
///
/// Production code uses [`CommandExecutorBackend`]; tests can provide their
/// own implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Hand the given tasks to the executor.
    ///
    /// The implementation is free to:
    /// - spawn OS processes (production)
    /// - simulate completion and emit `RunEvent`s (tests)
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<DispatchTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Process-spawning backend used in production.
///
/// Internally this wraps the executor loop in [`spawn_executor`]; the
/// runtime calls `dispatch_tasks`, which forwards the tasks to the
/// background loop via an mpsc channel.
pub struct CommandExecutorBackend {
    tx: mpsc::Sender<DispatchTask>,
}

impl CommandExecutorBackend {
    /// Create a new command executor backend, wiring it to the given run
    /// event sender and pool set.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RunEvent>, pools: Arc<PoolManager>) -> Self {
        let tx = spawn_executor(runtime_tx, pools);
        Self { tx }
    }
}

impl ExecutorBackend for CommandExecutorBackend {
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<DispatchTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
