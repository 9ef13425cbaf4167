//! BatchQueue - priority batch ingestion daemon
//!
//! CLI entry point: runs the daemon or talks to it over IPC.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use batchqueue::cli::{Cli, Command, OutputFormat};
use batchqueue::config::Config;
use batchqueue::domain::{BatchStatus, OverallStatus, SubmissionReport};
use batchqueue::ipc::{self, DaemonClient};
use batchqueue::{IngestService, daemon};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batchqueue")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("batchqueue.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    let socket_path = cli.socket.clone().unwrap_or_else(|| config.daemon.socket_path.clone());
    let client = DaemonClient::new(socket_path.clone());

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Daemon => cmd_daemon(config, socket_path).await,
        Command::Submit { ids, priority } => {
            let ids = Value::Array(ids.into_iter().map(Value::from).collect());
            let submission_id = client.submit(ids, priority).await?;
            println!("{} Submitted: {}", "✓".green(), submission_id.to_string().cyan());
            Ok(())
        }
        Command::Status { submission_id, format } => {
            let report = client.status(&submission_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print_report(&report),
            }
            Ok(())
        }
        Command::Stats { format } => {
            let stats = client.stats().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Text => {
                    let queue = &stats.queue;
                    println!(
                        "Dispatch loop: {}",
                        if queue.running { "running".green() } else { "idle".dimmed() }
                    );
                    println!("  Pending in queue: {}", queue.pending);
                    println!("  Submissions: {}", stats.records.submissions);
                    println!(
                        "  Batches: {} pending, {} dispatched, {} done, {} failed",
                        stats.records.pending, stats.records.dispatched, stats.records.done, stats.records.failed
                    );
                    println!(
                        "  Dispatched total: {} (peak queue depth {})",
                        queue.stats.total_dispatched, queue.stats.peak_queue_depth
                    );
                }
            }
            Ok(())
        }
        Command::Ping => {
            let version = client.ping().await?;
            println!("{} Daemon running (v{})", "✓".green(), version);
            Ok(())
        }
        Command::Stop => {
            client.shutdown().await?;
            println!("{} Daemon stopping", "✓".green());
            Ok(())
        }
    }
}

fn print_report(report: &SubmissionReport) {
    let overall = match report.overall_status {
        OverallStatus::Completed => report.overall_status.to_string().green(),
        OverallStatus::Triggered => report.overall_status.to_string().yellow(),
        OverallStatus::Failed => report.overall_status.to_string().red(),
        OverallStatus::Pending => report.overall_status.to_string().dimmed(),
    };
    println!("Submission: {} [{}]", report.submission_id.to_string().cyan(), overall);
    for batch in &report.batches {
        let status = match batch.status {
            BatchStatus::Done => batch.status.to_string().green(),
            BatchStatus::Dispatched => batch.status.to_string().yellow(),
            BatchStatus::Failed => batch.status.to_string().red(),
            BatchStatus::Pending => batch.status.to_string().dimmed(),
        };
        println!("  {} {:?} {}", batch.batch_id, batch.ids, status);
        if let Some(error) = &batch.error {
            println!("    {}", error.red());
        }
    }
}

async fn cmd_daemon(config: Config, socket_path: PathBuf) -> Result<()> {
    info!(?config, "cmd_daemon: starting");

    let service = Arc::new(IngestService::with_defaults(config.scheduler.clone()));
    let (listener, socket_path) = ipc::create_listener_at(&socket_path)?;
    info!(?socket_path, "IPC socket listening");
    println!("{} Listening on {}", "✓".green(), socket_path.display());

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    let mut server = tokio::spawn(daemon::serve(Arc::clone(&service), listener, shutdown_rx));

    use tokio::signal::unix::{SignalKind, signal};
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let finished = tokio::select! {
        _ = sigint.recv() => {
            warn!("SIGINT received");
            None
        }
        _ = sigterm.recv() => {
            warn!("SIGTERM received");
            None
        }
        joined = &mut server => Some(joined),
    };

    let joined = match finished {
        Some(joined) => joined,
        None => {
            let _ = shutdown_tx.send(()).await;
            server.await
        }
    };
    match joined {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "Daemon server task failed"),
    }

    let pending = service.queue_state().await.pending;
    if pending > 0 {
        warn!(pending, "Shutting down with batches still queued");
    }

    ipc::cleanup_socket(&socket_path);
    info!("Daemon shutdown complete");
    Ok(())
}
