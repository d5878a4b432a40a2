//! Error types for bulk-geocoder
//!
//! Two layers of errors live here:
//! - [`FailureReason`] describes why a single query failed. It never aborts a batch;
//!   it is carried inside [`Outcome::Failure`](crate::types::Outcome::Failure).
//! - [`Error`] is the crate-level error returned by fallible setup and by the
//!   dispatcher itself when its own bookkeeping breaks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bulk-geocoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bulk-geocoder
///
/// Per-query failures are not represented here; see [`FailureReason`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency_limit")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error raised while setting up the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Appending to the failure log failed
    #[error("failed to append to failure log {path}: {source}")]
    FailureLog {
        /// Path of the failure log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Per-query outcomes could not be matched back to their batch positions
    #[error("result aggregation failed: {0}")]
    Aggregation(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Why a single query failed to resolve
///
/// All variants are terminal for the query that produced them and non-fatal for
/// the batch. The string payloads are diagnostic detail only.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// No complete response arrived within the per-request timeout
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS or body-read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("server returned status {0}")]
    NonOkStatus(u16),

    /// The 2xx response body was not valid JSON
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl FailureReason {
    /// Machine-readable code for logs and events
    ///
    /// Returns a stable, snake_case identifier (e.g. "timeout", "non_ok_status").
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Transport(_) => "transport_error",
            FailureReason::NonOkStatus(_) => "non_ok_status",
            FailureReason::Decode(_) => "decode_error",
        }
    }

    /// Returns true if this failure was a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureReason::Timeout)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_codes_are_distinct_per_variant() {
        let cases = [
            (FailureReason::Timeout, "timeout"),
            (FailureReason::Transport("reset".into()), "transport_error"),
            (FailureReason::NonOkStatus(503), "non_ok_status"),
            (FailureReason::Decode("eof".into()), "decode_error"),
        ];

        for (reason, expected) in cases {
            assert_eq!(reason.code(), expected, "{reason:?} should map to {expected}");
        }
    }

    #[test]
    fn failure_reason_display_includes_status_code() {
        assert_eq!(
            FailureReason::NonOkStatus(404).to_string(),
            "server returned status 404"
        );
        assert_eq!(FailureReason::Timeout.to_string(), "request timed out");
    }

    #[test]
    fn failure_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(FailureReason::NonOkStatus(502)).unwrap();
        assert_eq!(json["kind"], "non_ok_status");
        assert_eq!(json["detail"], 502);

        let json = serde_json::to_value(FailureReason::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn config_error_carries_key() {
        let err = Error::config("concurrency_limit", "must be at least 1");
        match &err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("concurrency_limit"));
                assert_eq!(message, "must be at least 1");
            }
            other => panic!("expected Config error, got {other:?}"),
        }
        assert_eq!(err.to_string(), "configuration error: must be at least 1");
    }

    #[test]
    fn failure_log_error_exposes_source() {
        use std::error::Error as _;

        let err = Error::FailureLog {
            path: PathBuf::from("/nope/failed.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope/failed.csv"));
        assert!(err.source().is_some());
    }
}
