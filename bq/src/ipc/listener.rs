//! Daemon side of the socket: binding, cleanup and one-shot request handling

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use super::frame::{read_frame, write_frame};
use super::messages::{DaemonMessage, DaemonResponse};

/// Bind a listener at `socket_path`
///
/// Creates the parent directory and replaces a socket file left by a
/// previous run.
pub fn create_listener_at(socket_path: &Path) -> Result<(UnixListener, PathBuf)> {
    if let Some(dir) = socket_path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    match std::fs::remove_file(socket_path) {
        Ok(()) => debug!(?socket_path, "create_listener_at: replaced stale socket"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).context("Failed to remove stale socket"),
    }

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind IPC socket at {}", socket_path.display()))?;
    debug!(?socket_path, "create_listener_at: bound");
    Ok((listener, socket_path.to_path_buf()))
}

/// Remove the socket file; a missing file is fine
pub fn cleanup_socket(socket_path: &Path) {
    match std::fs::remove_file(socket_path) {
        Ok(()) => debug!(?socket_path, "cleanup_socket: removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(?socket_path, error = %e, "Failed to remove socket file"),
    }
}

/// Read the request frame of a connection
pub async fn read_message(stream: &mut UnixStream) -> Result<DaemonMessage> {
    let msg = read_frame(stream).await.context("Failed to read IPC message")?;
    debug!(?msg, "read_message: parsed");
    Ok(msg)
}

/// Write the response frame of a connection
pub async fn send_response(stream: &mut UnixStream, response: DaemonResponse) -> Result<()> {
    debug!(?response, "send_response: sending");
    write_frame(stream, &response).await.context("Failed to send IPC response")
}
