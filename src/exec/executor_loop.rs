// src/exec/executor_loop.rs

//! Background executor loop that picks up dispatched tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{DispatchTask, RunEvent};
use crate::exec::pools::PoolManager;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<DispatchTask>` is what the runtime (via
/// `CommandExecutorBackend`) uses to hand over ready tasks. Each dispatched
/// task runs in its own Tokio task; the engine dispatches a task at most
/// once per run, and pool slots bound how many actually execute at a time.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RunEvent>,
    pools: Arc<PoolManager>,
) -> mpsc::Sender<DispatchTask> {
    let (tx, mut rx) = mpsc::channel::<DispatchTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(task) = rx.recv().await {
            debug!(task = %task.name, "executor picked up task");
            let rt_tx = runtime_tx.clone();
            let task_pools = Arc::clone(&pools);

            tokio::spawn(async move {
                run_task(task, task_pools, rt_tx).await;
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
