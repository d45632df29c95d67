//! Pure retry policy for the outbound dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DispatchConfig;

/// Outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No attempts left.
    GiveUp,
}

/// Bounded fixed-delay retries with a per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retry_count: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Time budget for a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl RetryPolicy {
    /// Derives the policy from dispatcher configuration.
    #[must_use]
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            retry_delay: config.retry_delay(),
            attempt_timeout: config.request_timeout(),
        }
    }

    /// Sets the retry count.
    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Total attempts including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Decides what to do after `attempt` (1-indexed) failed.
    #[must_use]
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts() {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.retry_delay)
        }
    }
}
