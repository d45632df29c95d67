//! Outbound dispatcher with bounded retries.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::payload::OutboundPayload;
use super::policy::{RetryDecision, RetryPolicy};
use super::transport::{HttpResponse, HttpTransport};
use crate::config::DispatchConfig;
use crate::errors::{DispatchError, TransportError};
use crate::listing::ListingRecord;
use crate::relay::{MessagingTransport, RelayMessage};

/// Successful endpoint reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Success indicator; taken from the body when it carries one.
    pub success: bool,
    /// Message from the body, if any.
    pub message: Option<String>,
    /// Parsed body, or `{"message": <raw body>}` when it is not JSON.
    pub body: serde_json::Value,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Parses a response body, degrading to a message-only object.
#[must_use]
pub fn parse_body(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "message": raw }))
}

fn body_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn interpret(response: HttpResponse, attempts: u32) -> Result<DispatchReceipt, TransportError> {
    let body = parse_body(&response.body);
    let message = body_message(&body);
    if !response.is_success() {
        return Err(TransportError::status(response.status, message));
    }
    Ok(DispatchReceipt {
        success: body
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true),
        message,
        body,
        attempts,
    })
}

/// Sends listing payloads to the inventory endpoint.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    relay: Option<Arc<dyn MessagingTransport>>,
    policy: RetryPolicy,
    endpoint: String,
    platform: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint)
            .field("platform", &self.platform)
            .field("policy", &self.policy)
            .field("relay", &self.relay.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher from configuration.
    #[must_use]
    pub fn new(config: &DispatchConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            relay: None,
            policy: RetryPolicy::from_config(config),
            endpoint: config.endpoint_url(),
            platform: config.platform.clone(),
        }
    }

    /// Attaches a relay for best-effort `RegisterItem` notifications.
    #[must_use]
    pub fn with_relay(mut self, relay: Arc<dyn MessagingTransport>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Formats a record for this dispatcher's platform.
    #[must_use]
    pub fn payload_for(&self, record: &ListingRecord, fallback_url: &str) -> OutboundPayload {
        OutboundPayload::from_record(record, &self.platform, fallback_url)
    }

    /// Formats and sends a record.
    pub async fn send(
        &self,
        record: &ListingRecord,
        fallback_url: &str,
    ) -> Result<DispatchReceipt, DispatchError> {
        let payload = self.payload_for(record, fallback_url);
        self.dispatch(&payload).await
    }

    /// Notifies the relay, then sends the payload.
    pub async fn dispatch(
        &self,
        payload: &OutboundPayload,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.notify_relay(payload);
        self.send_payload(payload).await
    }

    /// Sends a prepared payload, retrying per the policy.
    pub async fn send_payload(
        &self,
        payload: &OutboundPayload,
    ) -> Result<DispatchReceipt, DispatchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, endpoint = %self.endpoint, "Sending payload");

            let outcome = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.transport.post_json(&self.endpoint, payload),
            )
            .await
            {
                Ok(Ok(response)) => interpret(response, attempt),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TransportError::Timeout(self.policy.attempt_timeout)),
            };

            let last_error = match outcome {
                Ok(receipt) => {
                    info!(attempt, title = %payload.title, "Payload dispatched");
                    return Ok(receipt);
                }
                Err(e) => e,
            };

            match self.policy.decide(attempt) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "Dispatch attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    error!(attempt, max_attempts, error = %last_error, "Dispatch failed");
                    return Err(DispatchError {
                        attempts: attempt,
                        last_error,
                    });
                }
            }
        }
    }

    /// Fires a `RegisterItem` message without waiting for it.
    fn notify_relay(&self, payload: &OutboundPayload) {
        let Some(relay) = self.relay.clone() else {
            return;
        };
        let message = RelayMessage::RegisterItem {
            data: payload.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = relay.send(message).await {
                warn!(error = %e, "Relay notification failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelayError;
    use crate::relay::MockMessagingTransport;
    use crate::testing::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn record() -> ListingRecord {
        ListingRecord::new().with_title("Film camera").with_price("¥1,000")
    }

    fn dispatcher(transport: Arc<ScriptedTransport>) -> Dispatcher {
        Dispatcher::new(&DispatchConfig::default(), transport)
    }

    #[test]
    fn test_parse_body_degrades_to_message() {
        assert_eq!(parse_body(r#"{"id": 1}"#), serde_json::json!({"id": 1}));
        assert_eq!(
            parse_body("<html>502</html>"),
            serde_json::json!({"message": "<html>502</html>"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new().then_respond(200, r#"{"id": "abc"}"#));
        let receipt = dispatcher(transport.clone())
            .send(&record(), "https://jp.mercari.com/item/m1")
            .await
            .unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.attempts, 1);
        assert_eq!(receipt.body["id"], "abc");
        assert_eq!(transport.call_count(), 1);

        let (url, payload) = transport.requests().remove(0);
        assert_eq!(url, "https://inventory-manager-rosy-five.vercel.app/api/items");
        assert_eq!(payload.price, Some(1000.0));
        assert_eq!(payload.source_url, "https://jp.mercari.com/item/m1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt_stops_retrying() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .then_respond(503, r#"{"message": "busy"}"#)
                .then_respond(200, r#"{"success": true, "message": "created"}"#)
                .then_respond(500, ""),
        );
        let started = tokio::time::Instant::now();
        let receipt = dispatcher(transport.clone())
            .send(&record(), "")
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
        assert_eq!(receipt.message.as_deref(), Some("created"));
        assert_eq!(transport.call_count(), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_last_error() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .then_fail(TransportError::Connection("refused".to_string()))
                .then_respond(500, "")
                .then_respond(502, "")
                .then_respond(500, r#"{"message": "database down"}"#),
        );
        let err = dispatcher(transport.clone())
            .send(&record(), "")
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 4);
        assert_eq!(err.user_message(), "database down");
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_aborts_only_that_attempt() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .then_hang()
                .then_respond(201, r#"{"ok": 1}"#),
        );
        let receipt = dispatcher(transport.clone())
            .with_policy(RetryPolicy::default().with_retry_count(1))
            .send(&record(), "")
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
        assert!(receipt.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_error_when_every_attempt_hangs() {
        let transport = Arc::new(ScriptedTransport::new().then_hang());
        let err = dispatcher(transport)
            .with_policy(RetryPolicy::default().with_retry_count(0))
            .send(&record(), "")
            .await
            .unwrap_err();

        assert_eq!(err.last_error, TransportError::Timeout(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_success_flag_is_respected() {
        let transport = Arc::new(
            ScriptedTransport::new().then_respond(200, r#"{"success": false, "message": "duplicate"}"#),
        );
        let receipt = dispatcher(transport).send(&record(), "").await.unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.message.as_deref(), Some("duplicate"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_failure_does_not_affect_dispatch() {
        let mut relay = MockMessagingTransport::new();
        relay
            .expect_send()
            .withf(|m| matches!(m, RelayMessage::RegisterItem { .. }))
            .times(1)
            .returning(|_| Err(RelayError::Unavailable("closed".to_string())));

        let transport = Arc::new(
            ScriptedTransport::new()
                .then_respond(500, "")
                .then_respond(200, "{}"),
        );
        let receipt = dispatcher(transport)
            .with_relay(Arc::new(relay))
            .send(&record(), "")
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
    }
}
