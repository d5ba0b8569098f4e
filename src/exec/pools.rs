// src/exec/pools.rs

//! Named concurrency pools.
//!
//! A pool caps how many tasks tagged with it may run at once; the shipped
//! config uses a capacity-1 `db` pool to serialize writers against the
//! embedded database. Tasks without a pool tag never wait.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};

/// Holds one semaphore per configured pool.
#[derive(Debug, Default)]
pub struct PoolManager {
    pools: HashMap<String, Arc<Semaphore>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pool set from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut manager = Self::new();
        for (name, pool) in cfg.pool.iter() {
            manager.add_pool(name, pool.capacity)?;
        }
        Ok(manager)
    }

    /// Define a pool. Capacity must be at least 1.
    pub fn add_pool(&mut self, name: &str, capacity: usize) -> Result<()> {
        if capacity < 1 {
            return Err(PipelineError::PoolCapacity {
                name: name.to_string(),
                capacity,
            });
        }
        self.pools
            .insert(name.to_string(), Arc::new(Semaphore::new(capacity)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    /// Acquire a slot in the given pool, waiting while it is at capacity.
    ///
    /// `None` tags (the default pool) are unbounded and return immediately
    /// without a permit. The permit is released when dropped; callers hold
    /// it across the whole attempt loop, not per attempt.
    pub async fn acquire(&self, tag: Option<&str>) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(tag) = tag else {
            return Ok(None);
        };

        let semaphore = self
            .pools
            .get(tag)
            .cloned()
            .ok_or_else(|| PipelineError::Config(format!("unknown pool '{tag}'")))?;

        debug!(pool = %tag, "acquiring pool slot");
        let permit = semaphore
            .acquire_owned()
            .await
            .context("pool semaphore closed")?;
        debug!(pool = %tag, "pool slot acquired");

        Ok(Some(permit))
    }
}
