//! Ingestion facade: submit and status
//!
//! Ties the batcher, the store, the scheduler and the ID generator together.
//! Transport layers (IPC, CLI) only ever talk to [`IngestService`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::batcher::split_into_batches;
use crate::domain::{
    Batch, BatchId, IdGenerator, MAX_ITEM_ID, MIN_ITEM_ID, Priority, Submission, SubmissionId, SubmissionReport,
    UuidGenerator,
};
use crate::error::{IngestError, IngestResult};
use crate::executor::{BatchExecutor, SimulatedExecutor};
use crate::scheduler::{QueueState, Scheduler, SchedulerConfig};
use crate::store::{SharedStore, Store, StoreCounts};

/// A validated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub ids: Vec<u64>,
    pub priority: Priority,
}

impl SubmitRequest {
    pub fn new(ids: Vec<u64>, priority: Priority) -> Self {
        Self { ids, priority }
    }

    /// Validate untyped input
    ///
    /// `ids` must be an array of integers in `1..=1_000_000_007`; `priority`
    /// is optional (absent or `null` means MEDIUM) and must otherwise be one
    /// of HIGH, MEDIUM, LOW.
    pub fn from_json(ids: &Value, priority: Option<&Value>) -> IngestResult<Self> {
        let Value::Array(values) = ids else {
            return Err(IngestError::Validation("Invalid IDs: expected an array of integers".to_string()));
        };

        let ids = values
            .iter()
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| IngestError::Validation(format!("Invalid ID: {}", v)))
            })
            .collect::<IngestResult<Vec<u64>>>()?;

        let priority = match priority {
            None | Some(Value::Null) => Priority::default(),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_| IngestError::Validation(format!("Invalid priority: {}", s)))?,
            Some(other) => return Err(IngestError::Validation(format!("Invalid priority: {}", other))),
        };

        let request = Self { ids, priority };
        request.validate()?;
        Ok(request)
    }

    /// Range-check every item ID
    pub fn validate(&self) -> IngestResult<()> {
        match self.ids.iter().find(|id| !(MIN_ITEM_ID..=MAX_ITEM_ID).contains(*id)) {
            Some(id) => Err(IngestError::Validation(format!(
                "Invalid ID: {} (must be between {} and {})",
                id, MIN_ITEM_ID, MAX_ITEM_ID
            ))),
            None => Ok(()),
        }
    }
}

/// Store snapshot plus scheduler state
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceStats {
    pub queue: QueueState,
    pub records: StoreCounts,
}

pub struct IngestService {
    store: SharedStore,
    scheduler: Arc<Scheduler>,
    ids: Arc<dyn IdGenerator>,
    batch_size: usize,
}

impl IngestService {
    pub fn new(config: SchedulerConfig, executor: Arc<dyn BatchExecutor>, ids: Arc<dyn IdGenerator>) -> Self {
        let store = Store::shared();
        let batch_size = config.batch_size;
        let scheduler = Scheduler::new(config, store.clone(), executor);
        Self {
            store,
            scheduler,
            ids,
            batch_size,
        }
    }

    /// Simulated executor and UUID identifiers
    pub fn with_defaults(config: SchedulerConfig) -> Self {
        let executor = Arc::new(SimulatedExecutor::new(config.item_delay()));
        Self::new(config, executor, Arc::new(UuidGenerator))
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Split into batches, register them and queue them for dispatch
    pub async fn submit(&self, request: SubmitRequest) -> IngestResult<SubmissionId> {
        debug!(ids = request.ids.len(), priority = %request.priority, "IngestService::submit: called");
        request.validate()?;

        let submission_id = SubmissionId::from(self.ids.next_id());
        let batches: Vec<Batch> = split_into_batches(&request.ids, self.batch_size)
            .into_iter()
            .map(|chunk| {
                let batch_id = BatchId::from(self.ids.next_id());
                Batch::new(batch_id, submission_id.clone(), chunk, request.priority)
            })
            .collect();
        let batch_ids: Vec<BatchId> = batches.iter().map(|b| b.id.clone()).collect();

        self.store
            .write()
            .await
            .insert_submission(Submission::new(submission_id.clone(), batch_ids.clone()), batches);

        info!(
            %submission_id,
            priority = %request.priority,
            items = request.ids.len(),
            batches = batch_ids.len(),
            "Accepted submission"
        );

        self.scheduler
            .submit_all(batch_ids.into_iter().map(|id| (id, request.priority)))
            .await;

        Ok(submission_id)
    }

    /// Validate untyped input, then submit
    pub async fn submit_json(&self, ids: &Value, priority: Option<&Value>) -> IngestResult<SubmissionId> {
        let request = SubmitRequest::from_json(ids, priority)?;
        self.submit(request).await
    }

    pub async fn status(&self, submission_id: &str) -> IngestResult<SubmissionReport> {
        debug!(%submission_id, "IngestService::status: called");
        self.store
            .read()
            .await
            .report(submission_id)
            .ok_or_else(|| IngestError::NotFound(submission_id.to_string()))
    }

    pub async fn queue_state(&self) -> QueueState {
        self.scheduler.queue_state().await
    }

    pub async fn stats(&self) -> ServiceStats {
        let queue = self.queue_state().await;
        let records = self.store.read().await.counts();
        ServiceStats { queue, records }
    }
}
