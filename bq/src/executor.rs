//! Batch execution
//!
//! An executor performs the work for one dispatched batch, item by item. The
//! scheduler only cares about the outcome: `Ok` lands the batch on `done`,
//! any [`ExecutionError`] lands it on `failed`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::BatchJob;
use crate::error::ExecutionError;

/// Default simulated processing latency per item
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(1000);

/// Performs the work for a single batch
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Process every item of `job` in order
    ///
    /// Must only return once all items are processed (or one has failed).
    async fn execute(&self, job: &BatchJob) -> Result<(), ExecutionError>;
}

/// Executor that stands in for real work with a fixed wait per item
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    item_delay: Duration,
}

impl SimulatedExecutor {
    pub fn new(item_delay: Duration) -> Self {
        Self { item_delay }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_DELAY)
    }
}

#[async_trait]
impl BatchExecutor for SimulatedExecutor {
    async fn execute(&self, job: &BatchJob) -> Result<(), ExecutionError> {
        info!(batch_id = %job.batch_id, ids = ?job.ids, "Processing batch");
        for id in &job.ids {
            tokio::time::sleep(self.item_delay).await;
            debug!(batch_id = %job.batch_id, id, "Processed item");
        }
        Ok(())
    }
}
