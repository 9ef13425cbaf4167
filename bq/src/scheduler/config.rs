//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::batcher::DEFAULT_BATCH_SIZE;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum spacing between the starts of two dispatches
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Simulated processing time per item
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Max items per batch, 1 to `MAX_BATCH_SIZE`
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Abort a batch's execution after this long (none = wait forever)
    #[serde(default)]
    pub batch_timeout_ms: Option<u64>,
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_item_delay_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            item_delay_ms: default_item_delay_ms(),
            batch_size: default_batch_size(),
            batch_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Get the dispatch interval as a Duration
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Get the per-item delay as a Duration
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}
