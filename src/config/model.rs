// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [pool.db]
/// capacity = 1
///
/// [task.dim_calendar]
/// cmd = "dbt run --select dim_calendar"
/// deps = ["stg_loan_data"]
/// pool = "db"
/// retry = { max_attempts = 3, delay_ms = 5000 }
///
/// [selection.dbt_models]
/// tasks = ["stg_loan_data", "dim_calendar"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Named resource pools from `[pool.<name>]`.
    #[serde(default)]
    pub pool: BTreeMap<String, PoolConfig>,

    /// All tasks from `[task.<name>]`. Keys are the task names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named selections from `[selection.<name>]`, runnable via `--job`.
    #[serde(default)]
    pub selection: BTreeMap<String, SelectionConfig>,
}

/// Validated configuration. Constructed only through
/// [`ConfigFile::try_from`] on a [`RawConfigFile`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pool: BTreeMap<String, PoolConfig>,
    pub task: BTreeMap<String, TaskConfig>,
    pub selection: BTreeMap<String, SelectionConfig>,
}

impl ConfigFile {
    /// Construct without re-running validation. Used by `validate` after
    /// the semantic checks have passed.
    pub(crate) fn new_unchecked(
        pool: BTreeMap<String, PoolConfig>,
        task: BTreeMap<String, TaskConfig>,
        selection: BTreeMap<String, SelectionConfig>,
    ) -> Self {
        Self {
            pool,
            task,
            selection,
        }
    }
}

/// `[pool.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of tasks in this pool running at once.
    pub capacity: usize,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The shell command to execute.
    pub cmd: String,

    /// Names of tasks that must succeed before this one runs.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Optional pool tag; tasks without one never wait on a pool slot.
    #[serde(default)]
    pub pool: Option<String>,

    /// Optional retry policy.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl TaskConfig {
    /// The effective retry policy, if any.
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.as_ref().map(RetryConfig::to_policy)
    }
}

/// `retry = { ... }` inline table on a task.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub max_attempts: u32,

    /// Base delay between attempts, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Multiplicative backoff factor; `1.0` means a fixed delay.
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Cap on any single delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_factor() -> f64 {
    1.0
}

fn default_max_delay_ms() -> u64 {
    60_000
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
            factor: self.factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// `[selection.<name>]` section: a named subset of tasks to run as a job.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    pub tasks: Vec<String>,
}
