//! Scheduler implementation

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{BatchId, BatchJob, Priority};
use crate::error::ExecutionError;
use crate::executor::BatchExecutor;
use crate::store::SharedStore;

use super::config::SchedulerConfig;
use super::queue::{QueueState, QueuedBatch, SchedulerStats};

/// Internal state protected by mutex
struct SchedulerInner {
    /// Pending batches, greatest entry dispatches next
    queue: BTreeSet<QueuedBatch>,

    /// Next insertion sequence number
    next_seq: u64,

    /// Start of the most recent dispatch
    last_dispatch: Option<Instant>,

    /// Whether a dispatch loop is currently active
    running: bool,

    /// Statistics
    stats: SchedulerStats,
}

/// The Scheduler orders pending batches by priority and submission order and
/// drives a single dispatch loop that spaces dispatch starts at least
/// `min_interval` apart.
///
/// The loop is started on demand by [`Scheduler::submit`] and exits once the
/// queue drains. The queue, the running flag and the last dispatch time all
/// live behind one mutex, so a submission can never observe a loop that is
/// about to exit and skip starting a new one.
pub struct Scheduler {
    config: SchedulerConfig,
    store: SharedStore,
    executor: Arc<dyn BatchExecutor>,
    inner: Mutex<SchedulerInner>,
    /// `true` while no dispatch loop is active
    idle_tx: watch::Sender<bool>,
}

impl Scheduler {
    /// Create a new scheduler over `store` that runs batches with `executor`
    pub fn new(config: SchedulerConfig, store: SharedStore, executor: Arc<dyn BatchExecutor>) -> Arc<Self> {
        debug!(?config, "Scheduler::new: called");
        let (idle_tx, _) = watch::channel(true);
        Arc::new(Self {
            config,
            store,
            executor,
            inner: Mutex::new(SchedulerInner {
                queue: BTreeSet::new(),
                next_seq: 0,
                last_dispatch: None,
                running: false,
                stats: SchedulerStats::default(),
            }),
            idle_tx,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Queue one pending batch
    pub async fn submit(self: &Arc<Self>, batch_id: BatchId, priority: Priority) {
        self.submit_all([(batch_id, priority)]).await;
    }

    /// Queue pending batches in the given order
    ///
    /// Each batch gets the next sequence number, so batches of one submission
    /// keep their relative order. Starts the dispatch loop if it is idle.
    pub async fn submit_all<I>(self: &Arc<Self>, batches: I)
    where
        I: IntoIterator<Item = (BatchId, Priority)>,
    {
        let mut inner = self.inner.lock().await;

        for (batch_id, priority) in batches {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            debug!(%batch_id, %priority, seq, "Scheduler::submit_all: queuing batch");
            inner.queue.insert(QueuedBatch::new(batch_id, priority, seq));
            inner.stats.total_submitted += 1;
        }
        inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.queue.len());

        if inner.running || inner.queue.is_empty() {
            debug!(running = inner.running, "Scheduler::submit_all: no loop to start");
            return;
        }

        inner.running = true;
        inner.stats.loops_started += 1;
        self.idle_tx.send_replace(false);
        drop(inner);

        debug!("Scheduler::submit_all: starting dispatch loop");
        tokio::spawn(Arc::clone(self).run());
    }

    /// The dispatch loop; exactly one instance runs while `inner.running` is set
    async fn run(self: Arc<Self>) {
        info!("Dispatch loop started");

        while let Some((entry, delay)) = self.select_next().await {
            if !delay.is_zero() {
                debug!(batch_id = %entry.batch_id, ?delay, "Scheduler::run: waiting for dispatch interval");
                tokio::time::sleep(delay).await;
            }

            let Some(job) = self.begin_dispatch(&entry).await else {
                continue;
            };

            info!(batch_id = %job.batch_id, priority = %job.priority, ids = ?job.ids, "Dispatched batch");
            let outcome = self.execute(job).await;
            self.finish(&entry.batch_id, outcome).await;
        }

        info!("Dispatch loop idle");
    }

    /// Pick the next batch and how long to wait before dispatching it
    ///
    /// Clears the running flag when the queue is empty.
    async fn select_next(&self) -> Option<(QueuedBatch, Duration)> {
        let mut inner = self.inner.lock().await;

        let Some(entry) = inner.queue.last().cloned() else {
            debug!("Scheduler::select_next: queue empty, going idle");
            inner.running = false;
            self.idle_tx.send_replace(true);
            return None;
        };

        let delay = match inner.last_dispatch {
            Some(last) => self.config.min_interval().saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        };
        debug!(batch_id = %entry.batch_id, priority = %entry.priority, seq = entry.seq, ?delay, "Scheduler::select_next: selected");
        Some((entry, delay))
    }

    /// Remove the entry from the queue and mark its batch dispatched, atomically
    async fn begin_dispatch(&self, entry: &QueuedBatch) -> Option<BatchJob> {
        let mut inner = self.inner.lock().await;

        if !inner.queue.remove(entry) {
            warn!(batch_id = %entry.batch_id, "Selected batch vanished from queue");
            return None;
        }

        let mut store = self.store.write().await;
        let Some(batch) = store.batch_mut(entry.batch_id.as_str()) else {
            warn!(batch_id = %entry.batch_id, "Queued batch missing from store");
            return None;
        };
        if let Err(e) = batch.mark_dispatched() {
            warn!(error = %e, "Scheduler::begin_dispatch: transition rejected");
            return None;
        }

        inner.last_dispatch = Some(Instant::now());
        inner.stats.total_dispatched += 1;
        Some(batch.job())
    }

    /// Run the executor on its own task so a panic or timeout only fails this batch
    async fn execute(&self, job: BatchJob) -> Result<(), ExecutionError> {
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move { executor.execute(&job).await });
        let abort = handle.abort_handle();

        let joined = match self.config.batch_timeout() {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return Err(ExecutionError::TimedOut(limit));
                }
            },
            None => handle.await,
        };

        joined.unwrap_or_else(|e| Err(ExecutionError::Panicked(describe_join_error(e))))
    }

    /// Record the execution outcome: dispatched -> done | failed
    async fn finish(&self, batch_id: &BatchId, outcome: Result<(), ExecutionError>) {
        let mut inner = self.inner.lock().await;
        let mut store = self.store.write().await;

        let Some(batch) = store.batch_mut(batch_id.as_str()) else {
            warn!(%batch_id, "Finished batch missing from store");
            return;
        };

        let result = match outcome {
            Ok(()) => {
                info!(%batch_id, "Batch done");
                inner.stats.total_completed += 1;
                batch.mark_done()
            }
            Err(e) => {
                warn!(%batch_id, error = %e, "Batch failed");
                inner.stats.total_failed += 1;
                batch.mark_failed(e.to_string())
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "Scheduler::finish: transition rejected");
        }
    }

    /// Get current queue state
    pub async fn queue_state(&self) -> QueueState {
        debug!("Scheduler::queue_state: called");
        let inner = self.inner.lock().await;

        QueueState {
            pending: inner.queue.len(),
            running: inner.running,
            last_dispatch_ago_ms: inner.last_dispatch.map(|t| t.elapsed().as_millis() as u64),
            stats: inner.stats.clone(),
        }
    }

    /// Get the scheduler statistics
    pub async fn stats(&self) -> SchedulerStats {
        self.inner.lock().await.stats.clone()
    }

    /// Pending batch IDs in the order they would dispatch now
    pub async fn pending(&self) -> Vec<BatchId> {
        let inner = self.inner.lock().await;
        inner.queue.iter().rev().map(|e| e.batch_id.clone()).collect()
    }

    /// Resolve once no dispatch loop is active
    pub async fn wait_until_idle(&self) {
        let mut idle_rx = self.idle_tx.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = idle_rx.wait_for(|idle| *idle).await;
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
