//! IPC message types for daemon communication
//!
//! Simple JSON-over-newline protocol. Each message is a single line of JSON followed by `\n`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{SubmissionId, SubmissionReport};
use crate::error::ErrorKind;
use crate::service::ServiceStats;

/// Messages from CLI to Daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonMessage {
    /// Submit item IDs; validated by the daemon, so both fields stay untyped
    Submit {
        ids: Value,
        #[serde(default)]
        priority: Option<Value>,
    },

    /// Query a submission's status
    Status { submission_id: String },

    /// Queue and record counters
    Stats,

    /// Ping to check if daemon is alive
    Ping,

    /// Request daemon to stop gracefully
    Shutdown,
}

/// Responses from Daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Acknowledgment
    Ok,

    /// Submission accepted
    Submitted { submission_id: SubmissionId },

    /// Status report
    Status { report: SubmissionReport },

    /// Counters
    Stats { stats: ServiceStats },

    /// Pong response to ping
    Pong { version: String },

    /// Error response
    Error { kind: ErrorKind, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submit_serialize() {
        let msg = DaemonMessage::Submit {
            ids: json!([1, 2, 3]),
            priority: Some(json!("HIGH")),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"Submit","ids":[1,2,3],"priority":"HIGH"}"#);
    }

    #[test]
    fn test_submit_without_priority_deserialize() {
        let msg: DaemonMessage = serde_json::from_str(r#"{"type":"Submit","ids":"not-an-array"}"#).unwrap();
        assert_eq!(
            msg,
            DaemonMessage::Submit {
                ids: json!("not-an-array"),
                priority: None,
            }
        );
    }

    #[test]
    fn test_status_deserialize() {
        let msg: DaemonMessage = serde_json::from_str(r#"{"type":"Status","submission_id":"s-1"}"#).unwrap();
        assert_eq!(
            msg,
            DaemonMessage::Status {
                submission_id: "s-1".to_string()
            }
        );
    }

    #[test]
    fn test_ping_serialize() {
        let json = serde_json::to_string(&DaemonMessage::Ping).unwrap();
        assert_eq!(json, r#"{"type":"Ping"}"#);
    }

    #[test]
    fn test_submitted_response_serialize() {
        let resp = DaemonResponse::Submitted {
            submission_id: SubmissionId::from("s-9"),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"type":"Submitted","submission_id":"s-9"}"#);
    }

    #[test]
    fn test_error_response_roundtrip() {
        let resp = DaemonResponse::Error {
            kind: ErrorKind::NotFound,
            message: "Submission not found: x".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Error","kind":"not_found","message":"Submission not found: x"}"#
        );
        let back: DaemonResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
