// src/store.rs

//! Per-run result store.
//!
//! Each task in a plan gets exactly one terminal [`TaskResult`]; a result is
//! never mutated once recorded. The store is owned by the run that produced
//! it and is the run's final output.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::dag::ExecutionPlan;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};

/// Terminal status of a task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Overall status of a run: succeeded only if every task succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// Terminal record for one task in one run.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub name: TaskName,
    pub status: TaskStatus,
    /// Number of attempts executed; 0 for skipped tasks.
    pub attempts: u32,
    /// Error detail for failed tasks.
    pub error: Option<String>,
    /// Wall-clock start of the first attempt; absent for skipped tasks.
    pub started_at: Option<SystemTime>,
    /// Wall-clock end of the last attempt; absent for skipped tasks.
    pub finished_at: Option<SystemTime>,
}

impl TaskResult {
    pub fn succeeded(
        name: TaskName,
        attempts: u32,
        started_at: SystemTime,
        finished_at: SystemTime,
    ) -> Self {
        Self {
            name,
            status: TaskStatus::Succeeded,
            attempts,
            error: None,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
        }
    }

    pub fn failed(
        name: TaskName,
        attempts: u32,
        error: String,
        started_at: SystemTime,
        finished_at: SystemTime,
    ) -> Self {
        Self {
            name,
            status: TaskStatus::Failed,
            attempts,
            error: Some(error),
            started_at: Some(started_at),
            finished_at: Some(finished_at),
        }
    }

    pub fn skipped(name: TaskName) -> Self {
        Self {
            name,
            status: TaskStatus::Skipped,
            attempts: 0,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Records one terminal result per task of a single plan.
#[derive(Debug)]
pub struct ResultStore {
    /// Plan order, kept so reports iterate deterministically.
    order: Vec<TaskName>,
    results: HashMap<TaskName, TaskResult>,
}

impl ResultStore {
    pub fn new(plan: &ExecutionPlan) -> Self {
        Self {
            order: plan.order().to_vec(),
            results: HashMap::new(),
        }
    }

    /// Record a terminal result. Exactly one record per task is allowed,
    /// and only for tasks that are part of the plan.
    pub fn record(&mut self, result: TaskResult) -> Result<()> {
        if !self.order.iter().any(|n| n == &result.name) {
            return Err(PipelineError::UnknownTask(result.name.clone()));
        }
        if self.results.contains_key(&result.name) {
            return Err(PipelineError::DuplicateTask(result.name.clone()));
        }
        self.results.insert(result.name.clone(), result);
        Ok(())
    }

    /// Terminal result for a task, or `None` if the task has not reached a
    /// terminal state yet. Querying a task outside the plan is an error.
    pub fn get(&self, name: &str) -> Result<Option<&TaskResult>> {
        if !self.order.iter().any(|n| n == name) {
            return Err(PipelineError::UnknownTask(name.to_string()));
        }
        Ok(self.results.get(name))
    }

    /// Whether every task in the plan has a terminal result.
    pub fn is_complete(&self) -> bool {
        self.results.len() == self.order.len()
    }

    /// Results in plan order; tasks without a terminal result are omitted.
    pub fn results(&self) -> impl Iterator<Item = &TaskResult> {
        self.order.iter().filter_map(|name| self.results.get(name))
    }

    /// Overall run status: succeeded only if every planned task succeeded.
    pub fn overall(&self) -> RunStatus {
        let all_succeeded = self.is_complete()
            && self
                .results()
                .all(|r| r.status == TaskStatus::Succeeded);
        if all_succeeded {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }
}

/// Final output of a run: the overall status plus per-task results.
#[derive(Debug)]
pub struct RunReport {
    overall: RunStatus,
    store: ResultStore,
}

impl RunReport {
    pub fn from_store(store: ResultStore) -> Self {
        Self {
            overall: store.overall(),
            store,
        }
    }

    pub fn overall(&self) -> RunStatus {
        self.overall
    }

    pub fn is_success(&self) -> bool {
        self.overall == RunStatus::Succeeded
    }

    pub fn get(&self, name: &str) -> Result<Option<&TaskResult>> {
        self.store.get(name)
    }

    pub fn results(&self) -> impl Iterator<Item = &TaskResult> {
        self.store.results()
    }
}
