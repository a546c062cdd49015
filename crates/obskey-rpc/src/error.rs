//! Error types for the obskey-rpc crate.
//!
//! Session establishment fails with [`ConnectionError`]; individual requests
//! over a live session fail with [`CommandError`].

use std::time::Duration;

use crate::protocol::{RequestStatus, STATUS_RESOURCE_NOT_FOUND};
use crate::transport::CodecError;

/// Errors that can occur while establishing a session
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Host unreachable: {address}: {reason}")]
    HostUnreachable { address: String, reason: String },

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("Connection timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl From<CodecError> for ConnectionError {
    fn from(e: CodecError) -> Self {
        Self::ProtocolMismatch(e.to_string())
    }
}

/// Errors that can occur for a single request over a session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session disconnected")]
    Disconnected,

    #[error("{}", backend_message(*.code, .message))]
    Backend { code: Option<u16>, message: String },
}

fn backend_message(code: Option<u16>, message: &str) -> String {
    match code {
        Some(code) => format!("Backend error {code}: {message}"),
        None => format!("Backend error: {message}"),
    }
}

impl CommandError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            code: None,
            message: message.into(),
        }
    }

    /// Map a failed request status onto the command error taxonomy.
    #[must_use]
    pub fn from_status(request_type: &str, status: &RequestStatus) -> Self {
        let comment = status
            .comment
            .clone()
            .unwrap_or_else(|| format!("{request_type} failed"));

        if status.code == STATUS_RESOURCE_NOT_FOUND {
            Self::NotFound(comment)
        } else {
            Self::Backend {
                code: Some(status.code),
                message: comment,
            }
        }
    }

    /// Re-report an error from the write half of a read-then-write sequence.
    ///
    /// Anything other than a lost session becomes `Backend`, since the entity
    /// was observed moments earlier.
    #[must_use]
    pub fn into_backend(self) -> Self {
        match self {
            Self::NotFound(message) => Self::Backend {
                code: Some(STATUS_RESOURCE_NOT_FOUND),
                message,
            },
            other => other,
        }
    }
}

impl From<CodecError> for CommandError {
    fn from(e: CodecError) -> Self {
        Self::backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{STATUS_GENERIC_ERROR, STATUS_OUTPUT_RUNNING};

    #[test]
    fn test_from_status_not_found() {
        let status = RequestStatus::failure(STATUS_RESOURCE_NOT_FOUND, "No source was found");
        let err = CommandError::from_status("SetCurrentProgramScene", &status);
        assert_eq!(err, CommandError::NotFound("No source was found".to_string()));
    }

    #[test]
    fn test_from_status_other_code_is_backend() {
        let status = RequestStatus::failure(STATUS_OUTPUT_RUNNING, "Output already running");
        let err = CommandError::from_status("StartStream", &status);
        assert_eq!(
            err,
            CommandError::Backend {
                code: Some(STATUS_OUTPUT_RUNNING),
                message: "Output already running".to_string(),
            }
        );
    }

    #[test]
    fn test_from_status_without_comment() {
        let status = RequestStatus {
            result: false,
            code: STATUS_GENERIC_ERROR,
            comment: None,
        };
        let err = CommandError::from_status("ToggleRecord", &status);
        assert!(err.to_string().contains("ToggleRecord failed"));
        assert!(err.to_string().contains("205"));
    }

    #[test]
    fn test_into_backend() {
        let err = CommandError::NotFound("filter gone".to_string()).into_backend();
        assert!(matches!(err, CommandError::Backend { code: Some(600), .. }));

        assert_eq!(
            CommandError::Disconnected.into_backend(),
            CommandError::Disconnected
        );

        let backend = CommandError::backend("boom");
        assert_eq!(backend.clone().into_backend(), backend);
    }

    #[test]
    fn test_command_error_display() {
        assert_eq!(CommandError::Disconnected.to_string(), "Session disconnected");
        assert_eq!(
            CommandError::NotFound("Scene 9".to_string()).to_string(),
            "Not found: Scene 9"
        );
        assert_eq!(
            CommandError::backend("request timed out").to_string(),
            "Backend error: request timed out"
        );
    }

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Connection timed out after 5000ms");

        let err = ConnectionError::HostUnreachable {
            address: "localhost:4455".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("localhost:4455"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_connection_error_from_codec() {
        let codec_err = CodecError::MessageTooLarge(999_999_999);
        let err: ConnectionError = codec_err.into();
        assert!(matches!(err, ConnectionError::ProtocolMismatch(_)));
        assert!(err.to_string().contains("999999999"));
    }

    #[test]
    fn test_command_error_from_codec() {
        let json_err = serde_json::from_str::<serde_json::Value>("}{").unwrap_err();
        let err: CommandError = CodecError::Json(json_err).into();
        assert!(matches!(err, CommandError::Backend { code: None, .. }));
    }
}
