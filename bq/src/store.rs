//! In-memory record store for submissions and batches
//!
//! The store exclusively owns every `Submission` and `Batch`. The scheduler
//! only holds batch IDs and mutates status through here, so a status query
//! never sees a stale copy.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Batch, BatchId, BatchReport, BatchStatus, Submission, SubmissionId, SubmissionReport};

/// Store shared between the service facade and the dispatch loop
pub type SharedStore = Arc<RwLock<Store>>;

/// Record counts by batch status
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoreCounts {
    pub submissions: usize,
    pub pending: usize,
    pub dispatched: usize,
    pub done: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct Store {
    submissions: HashMap<SubmissionId, Submission>,
    batches: HashMap<BatchId, Batch>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Register a submission together with its batches
    pub fn insert_submission(&mut self, submission: Submission, batches: Vec<Batch>) {
        debug!(submission_id = %submission.id, batch_count = batches.len(), "Store::insert_submission: called");
        for batch in batches {
            self.batches.insert(batch.id.clone(), batch);
        }
        self.submissions.insert(submission.id.clone(), submission);
    }

    pub fn submission(&self, id: &str) -> Option<&Submission> {
        self.submissions.get(id)
    }

    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.batches.get(id)
    }

    pub fn batch_mut(&mut self, id: &str) -> Option<&mut Batch> {
        self.batches.get_mut(id)
    }

    /// Build the status report for a submission, batches in creation order
    pub fn report(&self, id: &str) -> Option<SubmissionReport> {
        let submission = self.submissions.get(id)?;
        let batches = submission
            .batch_ids
            .iter()
            .filter_map(|batch_id| self.batches.get(batch_id))
            .map(BatchReport::from)
            .collect();
        Some(SubmissionReport::new(submission.id.clone(), batches))
    }

    pub fn counts(&self) -> StoreCounts {
        let mut counts = StoreCounts {
            submissions: self.submissions.len(),
            ..Default::default()
        };
        for batch in self.batches.values() {
            match batch.status {
                BatchStatus::Pending => counts.pending += 1,
                BatchStatus::Dispatched => counts.dispatched += 1,
                BatchStatus::Done => counts.done += 1,
                BatchStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
