//! Integration tests for BatchQueue
//!
//! These tests drive a real daemon over a Unix socket and the `bq` binary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use batchqueue::domain::{BatchStatus, OverallStatus, SequentialIds};
use batchqueue::executor::SimulatedExecutor;
use batchqueue::ipc::{self, DaemonClient};
use batchqueue::scheduler::SchedulerConfig;
use batchqueue::{IngestService, daemon};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        min_interval_ms: 50,
        item_delay_ms: 5,
        ..Default::default()
    }
}

struct TestDaemon {
    service: Arc<IngestService>,
    client: DaemonClient,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<eyre::Result<()>>,
}

fn start_daemon(socket_path: &Path) -> TestDaemon {
    let config = fast_config();
    let service = Arc::new(IngestService::new(
        config.clone(),
        Arc::new(SimulatedExecutor::new(config.item_delay())),
        Arc::new(SequentialIds::new("it")),
    ));
    let (listener, socket_path) = ipc::create_listener_at(socket_path).expect("Failed to bind socket");
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(daemon::serve(Arc::clone(&service), listener, shutdown_rx));

    TestDaemon {
        service,
        client: DaemonClient::new(socket_path),
        shutdown_tx,
        handle,
    }
}

// =============================================================================
// Daemon over IPC
// =============================================================================

#[tokio::test]
async fn test_daemon_ping() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let daemon = start_daemon(&temp_dir.path().join("bq.sock"));

    let version = daemon.client.ping().await.expect("ping failed");
    assert_eq!(version, env!("CARGO_PKG_VERSION"));

    daemon.shutdown_tx.send(()).await.expect("daemon already gone");
    let result = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
    assert!(result.is_ok(), "Daemon should stop within timeout");
}

#[tokio::test]
async fn test_submit_and_poll_until_completed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let daemon = start_daemon(&temp_dir.path().join("bq.sock"));

    let submission_id = daemon
        .client
        .submit(json!([1, 2, 3, 4, 5]), Some("HIGH".to_string()))
        .await
        .expect("submit failed");
    assert_eq!(submission_id.as_str(), "it-1");

    let report = daemon.client.status(submission_id.as_str()).await.expect("status failed");
    assert_eq!(report.batches.len(), 2);
    assert_eq!(report.batches[0].ids, vec![1, 2, 3]);
    assert_eq!(report.batches[1].ids, vec![4, 5]);

    daemon.service.scheduler().wait_until_idle().await;

    let report = daemon.client.status(submission_id.as_str()).await.expect("status failed");
    assert_eq!(report.overall_status, OverallStatus::Completed);
    assert!(report.batches.iter().all(|b| b.status == BatchStatus::Done));

    let stats = daemon.client.stats().await.expect("stats failed");
    assert_eq!(stats.records.submissions, 1);
    assert_eq!(stats.records.done, 2);
    assert_eq!(stats.queue.pending, 0);
    assert!(!stats.queue.running);

    drop(daemon.shutdown_tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
}

#[tokio::test]
async fn test_errors_come_back_with_kind() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let daemon = start_daemon(&temp_dir.path().join("bq.sock"));

    let err = daemon
        .client
        .submit(json!([1, 2]), Some("URGENT".to_string()))
        .await
        .expect_err("invalid priority should be rejected");
    assert!(err.to_string().contains("validation"), "got: {}", err);

    let err = daemon
        .client
        .submit(json!([0]), None)
        .await
        .expect_err("out of range id should be rejected");
    assert!(err.to_string().contains("validation"), "got: {}", err);

    let err = daemon
        .client
        .status("no-such-submission")
        .await
        .expect_err("unknown submission should be rejected");
    assert!(err.to_string().contains("not_found"), "got: {}", err);

    // Nothing was recorded for the rejected submissions
    let stats = daemon.client.stats().await.expect("stats failed");
    assert_eq!(stats.records.submissions, 0);

    drop(daemon.shutdown_tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
}

#[tokio::test]
async fn test_mixed_priorities_all_complete() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let daemon = start_daemon(&temp_dir.path().join("bq.sock"));

    let low = daemon
        .client
        .submit(json!([1, 2, 3, 4, 5, 6]), Some("LOW".to_string()))
        .await
        .expect("submit failed");
    let high = daemon
        .client
        .submit(json!([7, 8]), Some("HIGH".to_string()))
        .await
        .expect("submit failed");

    daemon.service.scheduler().wait_until_idle().await;

    let low = daemon.client.status(low.as_str()).await.expect("status failed");
    let high = daemon.client.status(high.as_str()).await.expect("status failed");
    assert_eq!(low.overall_status, OverallStatus::Completed);
    assert_eq!(high.overall_status, OverallStatus::Completed);

    let stats = daemon.client.stats().await.expect("stats failed");
    assert_eq!(stats.queue.stats.total_dispatched, 3);

    drop(daemon.shutdown_tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
}

#[tokio::test]
async fn test_client_shutdown_stops_daemon() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let daemon = start_daemon(&temp_dir.path().join("bq.sock"));

    daemon.client.shutdown().await.expect("shutdown failed");

    let result = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
    assert!(result.is_ok(), "Daemon should stop after Shutdown message");
    drop(daemon.shutdown_tx);
}

#[tokio::test]
async fn test_malformed_request_gets_error_response() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let socket_path = temp_dir.path().join("bq.sock");
    let daemon = start_daemon(&socket_path);

    let mut stream = UnixStream::connect(&socket_path).await.expect("connect failed");
    stream.write_all(b"{\"type\":\"Bogus\"}\n").await.expect("write failed");

    let mut line = String::new();
    BufReader::new(&mut stream)
        .read_line(&mut line)
        .await
        .expect("read failed");
    let response: serde_json::Value = serde_json::from_str(line.trim()).expect("response is json");
    assert_eq!(response["type"], "Error");
    assert_eq!(response["kind"], "validation");

    drop(daemon.shutdown_tx);
    let _ = tokio::time::timeout(Duration::from_secs(5), daemon.handle).await;
}

// =============================================================================
// CLI binary
// =============================================================================

fn bq(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bq").expect("bq binary");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_RUNTIME_DIR", home.path().join("run"));
    cmd
}

#[test]
fn test_cli_help_lists_commands() {
    let home = TempDir::new().expect("Failed to create temp dir");
    bq(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_cli_ping_without_daemon_fails() {
    let home = TempDir::new().expect("Failed to create temp dir");
    bq(&home)
        .args(["--socket", "missing.sock", "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect"));
}

#[test]
fn test_cli_rejects_non_numeric_ids() {
    let home = TempDir::new().expect("Failed to create temp dir");
    bq(&home).args(["submit", "one", "two"]).assert().failure();
}
