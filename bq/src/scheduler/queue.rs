//! Queue types for the scheduler

use serde::{Deserialize, Serialize};

use crate::domain::{BatchId, Priority};

/// A pending batch as seen by the scheduler: a reference into the store plus
/// its ordering key
#[derive(Debug, Clone)]
pub struct QueuedBatch {
    pub batch_id: BatchId,
    pub priority: Priority,
    /// Insertion order, unique per scheduler
    pub seq: u64,
}

impl QueuedBatch {
    pub fn new(batch_id: BatchId, priority: Priority, seq: u64) -> Self {
        Self {
            batch_id,
            priority,
            seq,
        }
    }
}

impl Eq for QueuedBatch {}

impl PartialEq for QueuedBatch {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Ord for QueuedBatch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher priority first, then earlier submission; the greatest entry runs next
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedBatch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_dispatched: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    /// How many times a dispatch loop was started from idle
    pub loops_started: u64,
    pub peak_queue_depth: usize,
}

/// Queue state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub pending: usize,
    pub running: bool,
    pub last_dispatch_ago_ms: Option<u64>,
    pub stats: SchedulerStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn entry(id: &str, priority: Priority, seq: u64) -> QueuedBatch {
        QueuedBatch::new(BatchId::from(id), priority, seq)
    }

    #[test]
    fn test_higher_priority_is_greater() {
        let high = entry("high", Priority::High, 3);
        let medium = entry("medium", Priority::Medium, 2);
        let low = entry("low", Priority::Low, 1);

        assert!(high > medium);
        assert!(medium > low);
    }

    #[test]
    fn test_same_priority_fifo() {
        let first = entry("first", Priority::Medium, 1);
        let second = entry("second", Priority::Medium, 2);

        // Earlier submission should come first (so it's "greater")
        assert!(first > second);
    }

    #[test]
    fn test_ordered_set_pops_in_dispatch_order() {
        let mut set = BTreeSet::new();
        set.insert(entry("l1", Priority::Low, 0));
        set.insert(entry("m1", Priority::Medium, 1));
        set.insert(entry("h1", Priority::High, 2));
        set.insert(entry("m2", Priority::Medium, 3));
        set.insert(entry("h2", Priority::High, 4));

        let order: Vec<String> = std::iter::from_fn(|| set.pop_last())
            .map(|e| e.batch_id.to_string())
            .collect();
        assert_eq!(order, vec!["h1", "h2", "m1", "m2", "l1"]);
    }
}
