// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pool, raw.task, raw.selection))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_pools(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_retry_policies(cfg)?;
    validate_selections(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipelineError::Config(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pools(cfg: &RawConfigFile) -> Result<()> {
    for (name, pool) in cfg.pool.iter() {
        if pool.capacity < 1 {
            return Err(PipelineError::PoolCapacity {
                name: name.clone(),
                capacity: pool.capacity,
            });
        }
    }

    for (name, task) in cfg.task.iter() {
        if let Some(ref tag) = task.pool {
            if !cfg.pool.contains_key(tag) {
                return Err(PipelineError::Config(format!(
                    "task '{}' references unknown pool '{}'",
                    name, tag
                )));
            }
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.deps.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(PipelineError::Config(format!(
                    "task '{}' has unknown dependency '{}' in `deps`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(PipelineError::Config(format!(
                    "task '{}' cannot depend on itself in `deps`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_retry_policies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let Some(ref retry) = task.retry {
            if retry.max_attempts < 1 {
                return Err(PipelineError::Config(format!(
                    "task '{}' has retry.max_attempts = 0 (must be >= 1)",
                    name
                )));
            }
            if !retry.factor.is_finite() || retry.factor <= 0.0 {
                return Err(PipelineError::Config(format!(
                    "task '{}' has invalid retry.factor {} (must be finite and > 0)",
                    name, retry.factor
                )));
            }
        }
    }
    Ok(())
}

fn validate_selections(cfg: &RawConfigFile) -> Result<()> {
    for (name, selection) in cfg.selection.iter() {
        if selection.tasks.is_empty() {
            return Err(PipelineError::Config(format!(
                "selection '{}' must name at least one task",
                name
            )));
        }
        for task in selection.tasks.iter() {
            if !cfg.task.contains_key(task) {
                return Err(PipelineError::Config(format!(
                    "selection '{}' references unknown task '{}'",
                    name, task
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Build a petgraph graph from the tasks and their dependencies.
    //
    // Edge direction: dep -> task
    // For:
    //   [task.B]
    //   deps = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.deps.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::CyclicDependency(node.to_string()))
        }
    }
}
