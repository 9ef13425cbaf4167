//! Daemon: serves submit/status over the IPC socket
//!
//! Each connection carries one request and one response and is handled on its
//! own task, so a slow client never holds up the accept loop.

use std::sync::Arc;

use eyre::Result;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ipc::{DaemonMessage, DaemonResponse, read_message, send_response};
use crate::service::IngestService;

/// Version reported in `Pong`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of handling one message
#[derive(Debug)]
pub struct Handled {
    pub response: DaemonResponse,
    pub shutdown: bool,
}

/// Map one IPC message onto the service
pub async fn handle_message(service: &IngestService, msg: DaemonMessage) -> Handled {
    debug!(?msg, "handle_message: called");
    let mut shutdown = false;

    let response = match msg {
        DaemonMessage::Submit { ids, priority } => match service.submit_json(&ids, priority.as_ref()).await {
            Ok(submission_id) => DaemonResponse::Submitted { submission_id },
            Err(e) => {
                debug!(error = %e, "handle_message: submit rejected");
                error_response(&e)
            }
        },
        DaemonMessage::Status { submission_id } => match service.status(&submission_id).await {
            Ok(report) => DaemonResponse::Status { report },
            Err(e) => error_response(&e),
        },
        DaemonMessage::Stats => DaemonResponse::Stats {
            stats: service.stats().await,
        },
        DaemonMessage::Ping => DaemonResponse::Pong {
            version: VERSION.to_string(),
        },
        DaemonMessage::Shutdown => {
            info!("Shutdown requested over IPC");
            shutdown = true;
            DaemonResponse::Ok
        }
    };

    Handled { response, shutdown }
}

fn error_response(e: &crate::error::IngestError) -> DaemonResponse {
    DaemonResponse::Error {
        kind: e.kind(),
        message: e.to_string(),
    }
}

/// Serve connections until `shutdown_rx` fires or a client sends `Shutdown`
pub async fn serve(
    service: Arc<IngestService>,
    listener: UnixListener,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    info!("Daemon serving");
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _addr)) => {
                        debug!("serve: IPC connection accepted");
                        let service = Arc::clone(&service);
                        let stop_tx = stop_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(&service, stream, stop_tx).await {
                                warn!(error = %e, "IPC connection error");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "IPC accept error");
                    }
                }
            }

            _ = stop_rx.recv() => {
                debug!("serve: stop requested by client");
                break;
            }

            _ = shutdown_rx.recv() => {
                debug!("serve: shutdown signal received");
                break;
            }
        }
    }

    info!("Daemon stopped serving");
    Ok(())
}

async fn handle_connection(service: &IngestService, mut stream: UnixStream, stop_tx: mpsc::Sender<()>) -> Result<()> {
    let msg = match read_message(&mut stream).await {
        Ok(msg) => msg,
        Err(e) => {
            let response = DaemonResponse::Error {
                kind: crate::error::ErrorKind::Validation,
                message: format!("{:#}", e),
            };
            send_response(&mut stream, response).await?;
            return Err(e);
        }
    };

    let handled = handle_message(service, msg).await;
    send_response(&mut stream, handled.response).await?;

    if handled.shutdown {
        let _ = stop_tx.send(()).await;
    }
    Ok(())
}
