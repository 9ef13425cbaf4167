//! IPC client for communicating with the daemon

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use serde_json::Value;
use tokio::net::UnixStream;
use tracing::debug;

use super::frame::{read_frame, write_frame};
use super::messages::{DaemonMessage, DaemonResponse};
use crate::domain::{SubmissionId, SubmissionReport};
use crate::service::ServiceStats;

/// Default timeout for IPC operations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for communicating with the daemon via IPC
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit item IDs with an optional priority name
    pub async fn submit(&self, ids: Value, priority: Option<String>) -> Result<SubmissionId> {
        debug!(%ids, ?priority, "DaemonClient: submitting");
        let msg = DaemonMessage::Submit {
            ids,
            priority: priority.map(Value::String),
        };
        match self.send_message(msg).await? {
            DaemonResponse::Submitted { submission_id } => Ok(submission_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self, submission_id: &str) -> Result<SubmissionReport> {
        debug!(%submission_id, "DaemonClient: querying status");
        let msg = DaemonMessage::Status {
            submission_id: submission_id.to_string(),
        };
        match self.send_message(msg).await? {
            DaemonResponse::Status { report } => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    pub async fn stats(&self) -> Result<ServiceStats> {
        match self.send_message(DaemonMessage::Stats).await? {
            DaemonResponse::Stats { stats } => Ok(stats),
            other => Err(unexpected(other)),
        }
    }

    /// Check if daemon is alive and get its version
    pub async fn ping(&self) -> Result<String> {
        debug!("DaemonClient: pinging daemon");
        match self.send_message(DaemonMessage::Ping).await? {
            DaemonResponse::Pong { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon to shutdown gracefully
    pub async fn shutdown(&self) -> Result<()> {
        debug!("DaemonClient: requesting daemon shutdown");
        match self.send_message(DaemonMessage::Shutdown).await? {
            DaemonResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// One request, one response, all within `self.timeout`
    async fn send_message(&self, msg: DaemonMessage) -> Result<DaemonResponse> {
        debug!(socket = %self.socket_path.display(), ?msg, "DaemonClient: sending");

        let exchange = async {
            let stream = UnixStream::connect(&self.socket_path).await.with_context(|| {
                format!(
                    "Failed to connect to daemon socket {} (is `bq daemon` running?)",
                    self.socket_path.display()
                )
            })?;
            self.send_on_stream(stream, msg).await
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| eyre::eyre!("Daemon did not answer within {:?}", self.timeout))?
    }

    async fn send_on_stream(&self, mut stream: UnixStream, msg: DaemonMessage) -> Result<DaemonResponse> {
        write_frame(&mut stream, &msg).await?;
        let response: DaemonResponse = read_frame(&mut stream)
            .await
            .context("Failed to read daemon response")?;
        debug!(?response, "DaemonClient: received");
        Ok(response)
    }
}

fn unexpected(response: DaemonResponse) -> eyre::Error {
    match response {
        DaemonResponse::Error { kind, message } => eyre::eyre!("Daemon error ({}): {}", kind, message),
        other => eyre::eyre!("Unexpected response: {:?}", other),
    }
}
