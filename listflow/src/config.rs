//! Configuration types for the listing pipeline.
//!
//! A [`PipelineConfig`] is built once (from defaults, a JSON document or a
//! file) and handed to the pipeline by value. Nothing mutates it afterwards;
//! changing behaviour means building a new pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::ListflowError;

/// Configuration for the incremental watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Settle delay before a batch starts, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// CSS selectors for the listing-container regions a mutation must touch.
    #[serde(default = "default_container_selectors")]
    pub container_selectors: Vec<String>,
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_container_selectors() -> Vec<String> {
    vec![
        "[data-testid=\"search-items\"]".to_string(),
        ".mer-list".to_string(),
        ".items-box-content".to_string(),
    ]
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            container_selectors: default_container_selectors(),
        }
    }
}

impl WatcherConfig {
    /// Gets the settle delay as a Duration.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Configuration for the outbound dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base URL of the inventory endpoint.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Path appended to the base URL.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Number of retries after the first attempt.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Fixed delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Platform tag written into every payload.
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_api_base_url() -> String {
    "https://inventory-manager-rosy-five.vercel.app".to_string()
}

fn default_api_endpoint() -> String {
    "/api/items".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_platform() -> String {
    "mercari".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_endpoint: default_api_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            platform: default_platform(),
        }
    }
}

impl DispatchConfig {
    /// Full endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_endpoint
        )
    }

    /// Gets the per-attempt timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Gets the retry delay as a Duration.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Fee model for the profitability calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfitConfig {
    /// Flat shipping cost added to the source price.
    #[serde(default = "default_shipping_cost")]
    pub shipping_cost: f64,
    /// Source marketplace commission rate (reported, not deducted).
    #[serde(default = "default_source_commission_rate")]
    pub source_commission_rate: f64,
    /// Target marketplace commission rate.
    #[serde(default = "default_target_commission_rate")]
    pub target_commission_rate: f64,
    /// Flat fulfillment fee charged by the target marketplace.
    #[serde(default = "default_fulfillment_fee")]
    pub target_fulfillment_fee: f64,
    /// Minimum profit rate in percent for a listing to count as profitable.
    #[serde(default = "default_min_profit_rate")]
    pub minimum_profit_rate_percent: f64,
}

fn default_shipping_cost() -> f64 {
    500.0
}

fn default_source_commission_rate() -> f64 {
    0.10
}

fn default_target_commission_rate() -> f64 {
    0.15
}

fn default_fulfillment_fee() -> f64 {
    500.0
}

fn default_min_profit_rate() -> f64 {
    20.0
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            shipping_cost: default_shipping_cost(),
            source_commission_rate: default_source_commission_rate(),
            target_commission_rate: default_target_commission_rate(),
            target_fulfillment_fee: default_fulfillment_fee(),
            minimum_profit_rate_percent: default_min_profit_rate(),
        }
    }
}

/// Token-length thresholds for the keyword salience filter.
///
/// The values are heuristics carried over for compatibility; tune freely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalienceConfig {
    /// Minimum length for ASCII alphanumeric/hyphen tokens.
    #[serde(default = "default_ascii_min_len")]
    pub ascii_min_len: usize,
    /// Minimum length for every other token.
    #[serde(default = "default_other_min_len")]
    pub other_min_len: usize,
}

fn default_ascii_min_len() -> usize {
    2
}

fn default_other_min_len() -> usize {
    4
}

impl Default for SalienceConfig {
    fn default() -> Self {
        Self {
            ascii_min_len: default_ascii_min_len(),
            other_min_len: default_other_min_len(),
        }
    }
}

/// Configuration for target-market searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSearchConfig {
    /// Search URL prefix; the encoded term is appended.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    /// Number of recent search terms to remember.
    #[serde(default = "default_max_recent_searches")]
    pub max_recent_searches: usize,
    /// Timeout for the relay connection check, in milliseconds.
    #[serde(default = "default_connection_check_timeout_ms")]
    pub connection_check_timeout_ms: u64,
}

fn default_search_base_url() -> String {
    "https://www.amazon.co.jp/s?k=".to_string()
}

fn default_max_recent_searches() -> usize {
    10
}

fn default_connection_check_timeout_ms() -> u64 {
    3_000
}

impl Default for MarketSearchConfig {
    fn default() -> Self {
        Self {
            search_base_url: default_search_base_url(),
            max_recent_searches: default_max_recent_searches(),
            connection_check_timeout_ms: default_connection_check_timeout_ms(),
        }
    }
}

impl MarketSearchConfig {
    /// Gets the connection check timeout as a Duration.
    #[must_use]
    pub fn connection_check_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_check_timeout_ms)
    }
}

/// Combined configuration threaded through the pipeline entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Watcher configuration.
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Dispatcher configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Profitability fee model.
    #[serde(default)]
    pub profit: ProfitConfig,
    /// Salience filter thresholds.
    #[serde(default)]
    pub salience: SalienceConfig,
    /// Target-market search configuration.
    #[serde(default)]
    pub market: MarketSearchConfig,
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ListflowError> {
        serde_json::from_str(json).map_err(|e| ListflowError::Config(e.to_string()))
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ListflowError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Sets the watcher settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.watcher.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the dispatcher base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.dispatch.api_base_url = url.into();
        self
    }

    /// Sets the dispatcher retry budget and fixed delay.
    #[must_use]
    pub fn with_retries(mut self, retry_count: u32, delay: Duration) -> Self {
        self.dispatch.retry_count = retry_count;
        self.dispatch.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Replaces the profitability fee model.
    #[must_use]
    pub fn with_profit(mut self, profit: ProfitConfig) -> Self {
        self.profit = profit;
        self
    }
}
