//! Domain types: priorities, identifiers, batches and submissions

mod batch;
mod id;
mod priority;
mod submission;

pub use batch::{Batch, BatchJob, BatchStatus};
pub use id::{BatchId, IdGenerator, SequentialIds, SubmissionId, UuidGenerator};
pub use priority::Priority;
pub use submission::{BatchReport, OverallStatus, Submission, SubmissionReport};

/// Smallest accepted item ID
pub const MIN_ITEM_ID: u64 = 1;

/// Largest accepted item ID (10^9 + 7)
pub const MAX_ITEM_ID: u64 = 1_000_000_007;
