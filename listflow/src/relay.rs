//! Messaging relay between execution contexts.
//!
//! The relay is an external collaborator consumed through
//! [`MessagingTransport`]. When it cannot deliver a command the caller falls
//! back to the direct equivalent action through a [`DirectOpener`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dispatch::OutboundPayload;
use crate::errors::RelayError;

/// Commands sent over the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayMessage {
    /// Liveness check.
    CheckConnection {
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// Open a target-market search for a keyword.
    #[serde(rename = "searchAmazon")]
    SearchTarget {
        /// Normalized search term.
        keyword: String,
    },
    /// Forward a registration payload.
    RegisterItem {
        /// The payload that is also sent to the inventory endpoint.
        data: OutboundPayload,
    },
}

impl RelayMessage {
    /// A liveness check stamped with the current time.
    #[must_use]
    pub fn check_connection() -> Self {
        Self::CheckConnection {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CheckConnection { .. } => "checkConnection",
            Self::SearchTarget { .. } => "searchAmazon",
            Self::RegisterItem { .. } => "registerItem",
        }
    }
}

/// Reply from the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Whether the other side handled the command.
    #[serde(default)]
    pub success: bool,
    /// Optional message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RelayResponse {
    /// A successful reply.
    #[must_use]
    pub fn ok(message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
        }
    }
}

/// Transport that relays commands to another execution context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Sends a message. `Ok(None)` means it was delivered without a reply.
    async fn send(&self, message: RelayMessage) -> Result<Option<RelayResponse>, RelayError>;
}

/// Direct equivalent of relay commands, used when the relay fails.
pub trait DirectOpener: Send + Sync {
    /// Opens a resource directly.
    fn open(&self, url: &str) -> Result<(), RelayError>;
}

/// Opener that only records the request in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOpener;

impl DirectOpener for LoggingOpener {
    fn open(&self, url: &str) -> Result<(), RelayError> {
        info!(url, "Opening resource directly");
        Ok(())
    }
}

/// Sends a connection check and waits up to `timeout` for a successful reply.
///
/// # Errors
///
/// [`RelayError::Timeout`] when no reply arrives in time,
/// [`RelayError::Unavailable`] when the reply is missing or unsuccessful, and
/// any error the transport itself returns.
pub async fn verify_connection(
    transport: &dyn MessagingTransport,
    timeout: Duration,
) -> Result<(), RelayError> {
    let reply = tokio::time::timeout(timeout, transport.send(RelayMessage::check_connection()))
        .await
        .map_err(|_| RelayError::Timeout)??;
    match reply {
        Some(response) if response.success => {
            debug!("Relay connection check answered");
            Ok(())
        }
        Some(response) => Err(RelayError::Unavailable(
            response
                .message
                .unwrap_or_else(|| "connection check declined".to_string()),
        )),
        None => Err(RelayError::Unavailable("no response".to_string())),
    }
}

/// Whether the relay answered a connection check with success in time.
pub async fn check_connection(transport: &dyn MessagingTransport, timeout: Duration) -> bool {
    match verify_connection(transport, timeout).await {
        Ok(()) => true,
        Err(RelayError::Timeout) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "Relay connection check timed out");
            false
        }
        Err(e) => {
            warn!(error = %e, "Relay connection check failed");
            false
        }
    }
}
