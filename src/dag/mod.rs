// src/dag/mod.rs

//! Dependency graph and planning.
//!
//! - [`graph`] holds a simple directed acyclic graph of tasks.
//! - [`planner`] expands a selection to its dependency closure and
//!   topologically orders it.
//! - [`plan`] defines the immutable [`ExecutionPlan`] output type.

pub mod graph;
pub mod plan;
pub mod planner;

pub use graph::DagGraph;
pub use plan::ExecutionPlan;
pub use planner::Planner;
