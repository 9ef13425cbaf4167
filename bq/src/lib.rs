//! BatchQueue - priority batch ingestion
//!
//! Accepts submissions of item IDs, splits them into small batches and
//! dispatches the batches one at a time in priority order, with a minimum
//! spacing between dispatch starts. The status of every submission can be
//! queried at any time and is derived from its batches.
//!
//! # Core Concepts
//!
//! - **Single consumer**: at most one dispatch loop is active; it starts on
//!   demand and exits when the queue drains
//! - **Ordering**: highest priority first, then earliest submitted
//! - **Rate limit**: dispatch starts are spaced at least `min_interval` apart
//! - **Store owns state**: the scheduler only holds batch IDs
//!
//! # Modules
//!
//! - [`domain`] - Priorities, IDs, batches, submissions, status aggregation
//! - [`batcher`] - Splitting item IDs into batches
//! - [`store`] - In-memory record store
//! - [`scheduler`] - Priority queue and dispatch loop
//! - [`executor`] - Batch execution trait and simulated executor
//! - [`service`] - Submit/status facade with input validation
//! - [`ipc`] / [`daemon`] - Unix socket transport
//! - [`config`] / [`cli`] - Configuration and command line

pub mod batcher;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod executor;
pub mod ipc;
pub mod scheduler;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::{Config, DaemonConfig};
pub use domain::{
    Batch, BatchId, BatchJob, BatchReport, BatchStatus, IdGenerator, OverallStatus, Priority, SequentialIds,
    Submission, SubmissionId, SubmissionReport, UuidGenerator,
};
pub use error::{ErrorKind, ExecutionError, IngestError, IngestResult};
pub use executor::{BatchExecutor, SimulatedExecutor};
pub use ipc::{DaemonClient, DaemonMessage, DaemonResponse};
pub use scheduler::{QueueState, Scheduler, SchedulerConfig, SchedulerStats};
pub use service::{IngestService, ServiceStats, SubmitRequest};
pub use store::{SharedStore, Store, StoreCounts};
