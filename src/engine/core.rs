// src/engine/core.rs

//! Pure per-run state machine.
//!
//! `CoreRun` owns the per-task states for one execution of a plan and
//! decides, on each completion event:
//! - which dependents must be skipped (transitively, when a task fails)
//! - which tasks became ready and should be dispatched
//! - whether the run is finished (all plan members terminal)
//!
//! It performs no IO; the async shell in [`super::runtime`] feeds it events
//! and executes the resulting dispatches.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::ExecutionPlan;
use crate::engine::{DispatchTask, TaskName};
use crate::errors::Result;
use crate::registry::FrozenRegistry;
use crate::retry::RetryPolicy;

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Waiting for dependencies to succeed.
    Pending,
    /// Dispatched to the executor.
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl RunState {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Skipped
        )
    }
}

/// Everything the core needs to know about one plan member.
#[derive(Debug, Clone)]
struct TaskEntry {
    name: TaskName,
    cmd: String,
    pool: Option<String>,
    retry: Option<RetryPolicy>,
    /// Direct dependencies; the plan closure guarantees they are members too.
    deps: Vec<TaskName>,
    /// Direct dependents within the plan.
    dependents: Vec<TaskName>,
    state: RunState,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Tasks that became ready and should go to the executor.
    pub dispatch: Vec<DispatchTask>,
    /// Tasks newly marked as skipped in this step.
    pub newly_skipped: Vec<TaskName>,
    /// Whether every plan member is now terminal.
    pub finished: bool,
}

/// State machine for a single run of an [`ExecutionPlan`].
#[derive(Debug)]
pub struct CoreRun {
    /// Plan order; ready tasks are always collected in this order.
    order: Vec<TaskName>,
    entries: HashMap<TaskName, TaskEntry>,
    aborted: bool,
}

impl CoreRun {
    /// Build the per-run state from a frozen registry and a plan.
    pub fn new(registry: &FrozenRegistry, plan: &ExecutionPlan) -> Result<Self> {
        let mut entries: HashMap<TaskName, TaskEntry> = HashMap::new();

        for name in plan.iter() {
            let task = registry.get(name)?;
            entries.insert(
                name.to_string(),
                TaskEntry {
                    name: task.name.clone(),
                    cmd: task.cmd.clone(),
                    pool: task.pool.clone(),
                    retry: task.retry,
                    deps: task.deps.clone(),
                    dependents: Vec::new(),
                    state: RunState::Pending,
                },
            );
        }

        // Populate dependents within the plan.
        let names: Vec<TaskName> = entries.keys().cloned().collect();
        for name in names {
            let deps = entries
                .get(&name)
                .map(|e| e.deps.clone())
                .unwrap_or_default();
            for dep in deps {
                if let Some(dep_entry) = entries.get_mut(&dep) {
                    dep_entry.dependents.push(name.clone());
                }
            }
        }

        Ok(Self {
            order: plan.order().to_vec(),
            entries,
            aborted: false,
        })
    }

    /// Dispatch the initial ready set (tasks with no dependencies).
    pub fn start(&mut self) -> Vec<DispatchTask> {
        let dispatch = self.collect_ready();
        debug!(ready = dispatch.len(), "run started; dispatching roots");
        dispatch
    }

    /// Whether every plan member has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.entries.values().all(|e| e.state.is_terminal())
    }

    /// Handle a completion event for a task.
    pub fn handle_completion(&mut self, task: &str, success: bool) -> CoreStep {
        let mut step = CoreStep::default();

        match self.entries.get_mut(task) {
            Some(entry) => {
                if entry.state != RunState::Running {
                    warn!(
                        task = %task,
                        state = ?entry.state,
                        "completion for task that is not running; ignoring"
                    );
                    step.finished = self.is_finished();
                    return step;
                }

                if success {
                    entry.state = RunState::Succeeded;
                    debug!(task = %task, "task succeeded");
                } else {
                    entry.state = RunState::Failed;
                    warn!(task = %task, "task failed; skipping dependents");
                    step.newly_skipped = self.mark_dependents_skipped(task);
                }
            }
            None => {
                warn!(task = %task, "completion for task outside the plan; ignoring");
                step.finished = self.is_finished();
                return step;
            }
        }

        if !self.aborted {
            step.dispatch = self.collect_ready();
        }
        step.finished = self.is_finished();
        step
    }

    /// Abort the run between tasks: every pending task is skipped; running
    /// tasks are left to finish and report normally.
    pub fn handle_abort(&mut self) -> CoreStep {
        self.aborted = true;

        let mut newly_skipped = Vec::new();
        for name in self.order.clone() {
            if let Some(entry) = self.entries.get_mut(&name) {
                if entry.state == RunState::Pending {
                    entry.state = RunState::Skipped;
                    newly_skipped.push(entry.name.clone());
                }
            }
        }

        warn!(
            skipped = newly_skipped.len(),
            "run aborted; pending tasks skipped"
        );

        CoreStep {
            dispatch: Vec::new(),
            newly_skipped,
            finished: self.is_finished(),
        }
    }

    /// Mark all pending dependents of a failed or skipped task as skipped,
    /// transitively. Dependents cannot be running yet (they wait for every
    /// dependency to succeed), so only pending entries are touched.
    fn mark_dependents_skipped(&mut self, root: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self
            .entries
            .get(root)
            .map(|e| e.dependents.clone())
            .unwrap_or_default();

        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(entry) = self.entries.get_mut(&name) {
                if entry.state == RunState::Pending {
                    entry.state = RunState::Skipped;
                    debug!(
                        task = %entry.name,
                        "skipping dependent due to upstream failure"
                    );
                    newly_skipped.push(entry.name.clone());
                    stack.extend(entry.dependents.iter().cloned());
                }
            }
        }

        newly_skipped
    }

    /// Collect pending tasks whose dependencies are all succeeded, mark
    /// them running, and return them in plan order.
    fn collect_ready(&mut self) -> Vec<DispatchTask> {
        let candidates: Vec<TaskName> = self
            .order
            .iter()
            .filter(|name| {
                self.entries
                    .get(name.as_str())
                    .is_some_and(|e| e.state == RunState::Pending && self.deps_succeeded(e))
            })
            .cloned()
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(entry) = self.entries.get_mut(&name) {
                entry.state = RunState::Running;
                debug!(task = %entry.name, "dependencies satisfied; dispatching");
                ready.push(DispatchTask {
                    name: entry.name.clone(),
                    cmd: entry.cmd.clone(),
                    pool: entry.pool.clone(),
                    retry: entry.retry,
                });
            }
        }

        ready
    }

    fn deps_succeeded(&self, entry: &TaskEntry) -> bool {
        entry.deps.iter().all(|dep| {
            self.entries
                .get(dep)
                .is_some_and(|d| d.state == RunState::Succeeded)
        })
    }
}
