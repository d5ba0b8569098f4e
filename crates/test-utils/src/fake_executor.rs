use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::sync::mpsc;

use pipedag::engine::{DispatchTask, RunEvent, TaskOutcome};
use pipedag::errors::Result;
use pipedag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports a scripted `TaskCompleted` outcome for each
///   dispatched task (success unless the name is in the failing set).
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RunEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RunEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    /// Script the given task to report failure instead of success.
    pub fn failing_task(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<DispatchTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed {
                        exit_code: 1,
                        detail: "scripted failure".to_string(),
                    }
                } else {
                    TaskOutcome::Success
                };

                let now = SystemTime::now();
                tx.send(RunEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                    attempts: 1,
                    started_at: now,
                    finished_at: now,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
