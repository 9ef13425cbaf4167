//! Batch records and their lifecycle
//!
//! A batch is the atomic unit of scheduling: up to `batch_size` item IDs that
//! are dispatched and executed together. Status only ever moves forward:
//!
//! ```text
//! pending ──▶ dispatched ──▶ done
//!                       └──▶ failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

use super::id::{BatchId, SubmissionId};
use super::priority::Priority;

/// Lifecycle status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Pending,
    Dispatched,
    Done,
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Dispatched => write!(f, "dispatched"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Stored batch record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub submission_id: SubmissionId,
    pub ids: Vec<u64>,
    pub priority: Priority,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the batch ends up `failed`
    pub error: Option<String>,
}

impl Batch {
    pub fn new(id: BatchId, submission_id: SubmissionId, ids: Vec<u64>, priority: Priority) -> Self {
        Self {
            id,
            submission_id,
            ids,
            priority,
            status: BatchStatus::Pending,
            created_at: Utc::now(),
            dispatched_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// pending -> dispatched
    pub fn mark_dispatched(&mut self) -> IngestResult<()> {
        self.transition(BatchStatus::Pending, BatchStatus::Dispatched)?;
        self.dispatched_at = Some(Utc::now());
        Ok(())
    }

    /// dispatched -> done
    pub fn mark_done(&mut self) -> IngestResult<()> {
        self.transition(BatchStatus::Dispatched, BatchStatus::Done)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// dispatched -> failed
    pub fn mark_failed(&mut self, error: impl Into<String>) -> IngestResult<()> {
        self.transition(BatchStatus::Dispatched, BatchStatus::Failed)?;
        self.finished_at = Some(Utc::now());
        self.error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, expected: BatchStatus, next: BatchStatus) -> IngestResult<()> {
        if self.status != expected {
            return Err(IngestError::InvalidState {
                batch_id: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Snapshot handed to the executor
    pub fn job(&self) -> BatchJob {
        BatchJob {
            batch_id: self.id.clone(),
            ids: self.ids.clone(),
            priority: self.priority,
        }
    }
}

/// What an executor needs to run one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub batch_id: BatchId,
    pub ids: Vec<u64>,
    pub priority: Priority,
}
