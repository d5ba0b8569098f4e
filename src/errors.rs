// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate task registration: '{0}'")]
    DuplicateTask(String),

    #[error("unknown task: '{0}'")]
    UnknownTask(String),

    #[error("cycle detected in task graph involving '{0}'")]
    CyclicDependency(String),

    #[error("pool '{name}' has invalid capacity {capacity} (must be >= 1)")]
    PoolCapacity { name: String, capacity: usize },

    #[error("task '{task}' failed: {detail}")]
    TaskExecution { task: String, detail: String },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
