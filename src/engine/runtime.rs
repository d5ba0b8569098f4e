// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{CoreRun, CoreStep, DispatchTask, RunEvent, TaskOutcome};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::store::{ResultStore, RunReport, TaskResult};

/// Drives a single run to completion in response to [`RunEvent`]s, and
/// delegates actual command execution to an [`ExecutorBackend`].
///
/// This is a pure IO shell around [`CoreRun`], which contains all the run
/// semantics. The shell reads events from the channel, records terminal
/// results into the store (one writer per task name), and dispatches ready
/// tasks to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRun,
    store: ResultStore,
    event_rx: mpsc::Receiver<RunEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRun,
        store: ResultStore,
        event_rx: mpsc::Receiver<RunEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            store,
            event_rx,
            executor,
        }
    }

    /// Run the plan to completion and return the report.
    ///
    /// Execution-time failures never surface as errors here; they are
    /// recorded per task and reflected in the report's overall status.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("pipeline run started");

        let initial = self.core.start();
        self.dispatch(initial).await?;

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!("run event channel closed before the run finished");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = match event {
                RunEvent::TaskCompleted {
                    task,
                    outcome,
                    attempts,
                    started_at,
                    finished_at,
                } => {
                    let success = outcome.is_success();
                    let result = match outcome {
                        TaskOutcome::Success => {
                            TaskResult::succeeded(task.clone(), attempts, started_at, finished_at)
                        }
                        TaskOutcome::Failed { exit_code, detail } => TaskResult::failed(
                            task.clone(),
                            attempts,
                            format!("exit code {exit_code}: {detail}"),
                            started_at,
                            finished_at,
                        ),
                    };
                    self.store.record(result)?;
                    self.core.handle_completion(&task, success)
                }
                RunEvent::AbortRequested => self.core.handle_abort(),
            };

            let finished = step.finished;
            self.apply_step(step).await?;

            if finished {
                debug!("all plan members terminal; stopping runtime");
                break;
            }
        }

        let report = RunReport::from_store(self.store);
        info!(overall = ?report.overall(), "pipeline run finished");
        Ok(report)
    }

    async fn apply_step(&mut self, step: CoreStep) -> Result<()> {
        for name in step.newly_skipped {
            self.store.record(TaskResult::skipped(name))?;
        }
        self.dispatch(step.dispatch).await
    }

    async fn dispatch(&mut self, tasks: Vec<DispatchTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.dispatch_tasks(tasks).await
    }
}
