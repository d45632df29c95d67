//! Error types for the listflow pipeline.
//!
//! Extraction and classification never produce errors: a missing field is an
//! absent value and an unknown page is [`crate::page::PageType::Unknown`].
//! The types here cover the outward-facing seams (configuration, the outbound
//! dispatcher, the messaging relay and the compliance filter).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// The main error type for listflow operations.
#[derive(Debug, Error)]
pub enum ListflowError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The outbound dispatcher exhausted its attempts.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// The messaging relay and its direct fallback both failed.
    #[error("{0}")]
    Relay(#[from] RelayError),

    /// A single transport call failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The compliance filter failed to initialize.
    #[error("Compliance filter unavailable: {0}")]
    ComplianceUnavailable(String),

    /// The caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator required by the operation was not wired in.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one outbound HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt did not complete within its time budget.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The request never produced a response.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or a generic status line.
        message: String,
    },
}

impl TransportError {
    /// Builds a status error, preferring the endpoint's own message.
    #[must_use]
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self::Status {
            status,
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP error: {status}")),
        }
    }
}

/// Raised when every dispatch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Dispatch failed after {attempts} attempt(s): {last_error}")]
pub struct DispatchError {
    /// Number of attempts that were made.
    pub attempts: u32,
    /// The error from the final attempt.
    pub last_error: TransportError,
}

impl DispatchError {
    /// Message suitable for showing to a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.last_error.to_string()
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("attempts".to_string(), serde_json::json!(self.attempts));
        map.insert(
            "last_error".to_string(),
            serde_json::Value::String(self.last_error.to_string()),
        );
        if let TransportError::Status { status, .. } = self.last_error {
            map.insert("status".to_string(), serde_json::json!(status));
        }
        map
    }
}

/// Failure of the messaging relay or of its direct-action fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RelayError {
    /// The relay could not deliver the message.
    #[error("Relay unavailable: {0}")]
    Unavailable(String),

    /// The relay did not answer in time.
    #[error("Relay timed out")]
    Timeout,

    /// The direct equivalent action failed as well.
    #[error("Direct action failed: {0}")]
    Direct(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_prefers_body_message() {
        let err = TransportError::status(500, Some("database down".to_string()));
        assert_eq!(err.to_string(), "database down");

        let err = TransportError::status(502, None);
        assert_eq!(err.to_string(), "HTTP error: 502");

        let err = TransportError::status(404, Some(String::new()));
        assert_eq!(err.to_string(), "HTTP error: 404");
    }

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30000ms");
    }

    #[test]
    fn test_dispatch_error_display_and_dict() {
        let err = DispatchError {
            attempts: 4,
            last_error: TransportError::status(503, None),
        };

        assert_eq!(
            err.to_string(),
            "Dispatch failed after 4 attempt(s): HTTP error: 503"
        );
        assert_eq!(err.user_message(), "HTTP error: 503");

        let dict = err.to_dict();
        assert_eq!(dict.get("attempts"), Some(&serde_json::json!(4)));
        assert_eq!(dict.get("status"), Some(&serde_json::json!(503)));
    }

    #[test]
    fn test_listflow_error_from_dispatch() {
        let err: ListflowError = DispatchError {
            attempts: 1,
            last_error: TransportError::Connection("refused".to_string()),
        }
        .into();

        assert!(matches!(err, ListflowError::Dispatch(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_not_configured_display() {
        let err = ListflowError::NotConfigured("Outbound dispatcher");
        assert_eq!(err.to_string(), "Outbound dispatcher is not configured");
    }
}
