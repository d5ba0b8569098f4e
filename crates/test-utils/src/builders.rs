#![allow(dead_code)]

use std::collections::BTreeMap;

use pipedag::config::{
    ConfigFile, PoolConfig, RawConfigFile, RetryConfig, SelectionConfig, TaskConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pool: BTreeMap::new(),
                task: BTreeMap::new(),
                selection: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_pool(mut self, name: &str, capacity: usize) -> Self {
        self.config
            .pool
            .insert(name.to_string(), PoolConfig { capacity });
        self
    }

    pub fn with_selection(mut self, name: &str, tasks: &[&str]) -> Self {
        self.config.selection.insert(
            name.to_string(),
            SelectionConfig {
                tasks: tasks.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Raw, unvalidated config for tests that exercise validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                deps: vec![],
                pool: None,
                retry: None,
            },
        }
    }

    pub fn dep(mut self, dep: &str) -> Self {
        self.task.deps.push(dep.to_string());
        self
    }

    pub fn pool(mut self, name: &str) -> Self {
        self.task.pool = Some(name.to_string());
        self
    }

    pub fn retry(mut self, max_attempts: u32, delay_ms: u64) -> Self {
        self.task.retry = Some(RetryConfig {
            max_attempts,
            delay_ms,
            factor: 1.0,
            max_delay_ms: 60_000,
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
