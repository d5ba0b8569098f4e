// src/registry.rs

//! Explicit task registry.
//!
//! Tasks are registered one by one (or in bulk from a validated config),
//! then the registry is frozen exactly once before planning. Freezing
//! checks that every dependency name resolves to a registered task, so a
//! bad reference fails fast instead of surfacing mid-run. Registration
//! order is preserved; the planner uses it as a deterministic tie-break.

use std::collections::HashMap;

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::retry::RetryPolicy;

/// A named, retryable unit of work with declared dependencies.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    /// Shell command executed when the task runs.
    pub cmd: String,
    /// Names of tasks that must succeed before this one starts.
    pub deps: Vec<TaskName>,
    /// Optional concurrency pool tag.
    pub pool: Option<String>,
    /// Optional retry policy; tasks without one get a single attempt.
    pub retry: Option<RetryPolicy>,
}

/// Mutable registry populated before a run is planned.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    order: Vec<TaskName>,
    tasks: HashMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Fails if the name is already taken.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(PipelineError::DuplicateTask(task.name.clone()));
        }
        self.order.push(task.name.clone());
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    /// Look up a registered task by name.
    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTask(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate dependency references and produce an immutable registry.
    ///
    /// After this point no further registration is possible; planning and
    /// execution only ever see a [`FrozenRegistry`].
    pub fn freeze(self) -> Result<FrozenRegistry> {
        for task in self.order.iter().filter_map(|name| self.tasks.get(name)) {
            for dep in task.deps.iter() {
                if dep == &task.name {
                    return Err(PipelineError::Config(format!(
                        "task '{}' cannot depend on itself",
                        task.name
                    )));
                }
                if !self.tasks.contains_key(dep) {
                    return Err(PipelineError::UnknownTask(dep.clone()));
                }
            }
        }

        let index = self
            .order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(FrozenRegistry {
            order: self.order,
            tasks: self.tasks,
            index,
        })
    }
}

/// Immutable, validated registry shared by planner and executor.
#[derive(Debug)]
pub struct FrozenRegistry {
    order: Vec<TaskName>,
    tasks: HashMap<TaskName, Task>,
    index: HashMap<TaskName, usize>,
}

impl FrozenRegistry {
    /// Build a registry from a validated [`ConfigFile`] and freeze it.
    ///
    /// Config task tables are sorted by name, so registration order is the
    /// name order of the file's `[task.*]` sections.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = TaskRegistry::new();

        for (name, tc) in cfg.task.iter() {
            registry.register(Task {
                name: name.clone(),
                cmd: tc.cmd.clone(),
                deps: tc.deps.clone(),
                pool: tc.pool.clone(),
                retry: tc.retry_policy(),
            })?;
        }

        registry.freeze()
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Tasks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    /// Position of a task in registration order.
    pub fn registration_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
