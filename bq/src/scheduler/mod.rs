//! Scheduler for batch dispatch
//!
//! Orders pending batches by priority and submission order, and runs them one
//! at a time through a single self-draining dispatch loop with a minimum
//! spacing between dispatch starts.

mod config;
mod core;
mod queue;

pub use config::SchedulerConfig;
pub use core::Scheduler;
pub use queue::{QueueState, QueuedBatch, SchedulerStats};
