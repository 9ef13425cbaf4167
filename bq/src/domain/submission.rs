//! Submissions and their derived overall status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::batch::{Batch, BatchStatus};
use super::id::{BatchId, SubmissionId};

/// A client submission: an ordered list of batches, nothing more
///
/// The overall status is never stored, it is recomputed from the batches on
/// every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub batch_ids: Vec<BatchId>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(id: SubmissionId, batch_ids: Vec<BatchId>) -> Self {
        Self {
            id,
            batch_ids,
            created_at: Utc::now(),
        }
    }
}

/// Aggregated status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Pending,
    Triggered,
    Completed,
    Failed,
}

impl OverallStatus {
    /// Derive the overall status from batch statuses; first matching rule wins
    ///
    /// 1. every batch done (vacuously true for none) -> completed
    /// 2. any batch dispatched -> triggered
    /// 3. nothing pending and at least one failed -> failed
    /// 4. otherwise -> pending
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = BatchStatus>,
    {
        let mut all_done = true;
        let mut any_dispatched = false;
        let mut any_pending = false;
        let mut any_failed = false;

        for status in statuses {
            all_done &= status == BatchStatus::Done;
            match status {
                BatchStatus::Pending => any_pending = true,
                BatchStatus::Dispatched => any_dispatched = true,
                BatchStatus::Failed => any_failed = true,
                BatchStatus::Done => {}
            }
        }

        if all_done {
            Self::Completed
        } else if any_dispatched {
            Self::Triggered
        } else if !any_pending && any_failed {
            Self::Failed
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Triggered => write!(f, "triggered"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-batch line of a status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub ids: Vec<u64>,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Batch> for BatchReport {
    fn from(batch: &Batch) -> Self {
        Self {
            batch_id: batch.id.clone(),
            ids: batch.ids.clone(),
            status: batch.status,
            error: batch.error.clone(),
        }
    }
}

/// Answer to a status query, batches in creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub submission_id: SubmissionId,
    pub overall_status: OverallStatus,
    pub batches: Vec<BatchReport>,
}

impl SubmissionReport {
    pub fn new(submission_id: SubmissionId, batches: Vec<BatchReport>) -> Self {
        let overall_status = OverallStatus::aggregate(batches.iter().map(|b| b.status));
        Self {
            submission_id,
            overall_status,
            batches,
        }
    }
}
