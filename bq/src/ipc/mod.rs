//! Inter-Process Communication between the CLI and the daemon
//!
//! Unix Domain Socket carrying one line of JSON per message. The CLI connects,
//! sends a [`DaemonMessage`] and reads back a single [`DaemonResponse`].

use std::path::PathBuf;

pub mod client;
pub mod frame;
pub mod listener;
pub mod messages;

pub use client::DaemonClient;
pub use listener::{cleanup_socket, create_listener_at, read_message, send_response};
pub use messages::{DaemonMessage, DaemonResponse};

/// Maximum message size in bytes, either direction
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Get the default socket path for daemon IPC
pub fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("batchqueue")
        .join("bq.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path_ends_with_bq_sock() {
        let path = get_socket_path();
        assert!(path.ends_with("batchqueue/bq.sock"));
    }
}
