//! Error types for ingestion and batch execution

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the ingestion error type.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Errors surfaced to callers of submit/status
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed or out-of-range submit input; nothing was mutated
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown submission identifier
    #[error("Submission not found: {0}")]
    NotFound(String),

    /// A batch was asked to make a transition its lifecycle does not allow
    #[error("Invalid state transition: batch {batch_id} is '{from}', cannot become '{to}'")]
    InvalidState { batch_id: String, from: String, to: String },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::Internal,
        }
    }
}

/// Coarse error category carried over IPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Failure while executing a dispatched batch
///
/// Recovered locally by the scheduler: the batch lands on `failed` and the
/// dispatch loop moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("item {item} failed: {reason}")]
    ItemFailed { item: u64, reason: String },

    #[error("batch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("executor panicked: {0}")]
    Panicked(String),
}
