// src/config/mod.rs

//! TOML configuration for pipedag.
//!
//! - [`model`] is the serde-facing data model (`[pool.*]`, `[task.*]`,
//!   `[selection.*]`).
//! - [`loader`] reads a file and produces a validated [`model::ConfigFile`].
//! - [`validate`] holds the semantic checks that turn a `RawConfigFile`
//!   into a `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, PoolConfig, RawConfigFile, RetryConfig, SelectionConfig, TaskConfig};
