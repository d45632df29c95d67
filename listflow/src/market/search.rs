//! Target-market search launching.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

use crate::compliance::ComplianceGate;
use crate::config::{MarketSearchConfig, SalienceConfig};
use crate::errors::{ListflowError, RelayError};
use crate::normalize::normalize_term;
use crate::relay::{DirectOpener, MessagingTransport, RelayMessage};

/// Optional search refinements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Category (`i=` parameter).
    pub category: Option<String>,
    /// Sort order (`s=` parameter).
    pub sort: Option<String>,
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the search URL for a term.
#[must_use]
pub fn build_search_url(base: &str, term: &str, options: &SearchOptions) -> String {
    let mut url = format!("{base}{}", encode(term));
    if let Some(category) = options.category.as_deref().filter(|c| !c.is_empty()) {
        url.push_str("&i=");
        url.push_str(&encode(category));
    }
    if let Some(sort) = options.sort.as_deref().filter(|s| !s.is_empty()) {
        url.push_str("&s=");
        url.push_str(&encode(sort));
    }
    url
}

/// Most-recent-first list of search terms without duplicates.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    terms: VecDeque<String>,
    capacity: usize,
}

impl SearchHistory {
    /// Creates an empty history holding at most `capacity` terms.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            terms: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Moves `term` to the front, evicting the oldest term past capacity.
    pub fn record(&mut self, term: &str) {
        self.terms.retain(|t| t != term);
        self.terms.push_front(term.to_string());
        self.terms.truncate(self.capacity);
    }

    /// Terms, most recent first.
    #[must_use]
    pub fn recent(&self) -> Vec<String> {
        self.terms.iter().cloned().collect()
    }
}

/// How a search was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchChannel {
    /// Delivered over the messaging relay.
    Relay,
    /// Opened directly after the relay failed or was absent.
    Direct,
}

/// Result of launching a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLaunch {
    /// Normalized search term.
    pub term: String,
    /// Search URL.
    pub url: String,
    /// Channel that opened the search.
    pub channel: LaunchChannel,
}

/// Launches target-market searches for listing titles.
pub struct MarketSearch {
    config: MarketSearchConfig,
    salience: SalienceConfig,
    history: Mutex<SearchHistory>,
    relay: Option<Arc<dyn MessagingTransport>>,
    opener: Arc<dyn DirectOpener>,
}

impl std::fmt::Debug for MarketSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketSearch")
            .field("config", &self.config)
            .field("history", &*self.history.lock())
            .field("relay", &self.relay.is_some())
            .finish_non_exhaustive()
    }
}

impl MarketSearch {
    /// Creates a launcher.
    #[must_use]
    pub fn new(
        config: MarketSearchConfig,
        salience: SalienceConfig,
        opener: Arc<dyn DirectOpener>,
    ) -> Self {
        let history = SearchHistory::new(config.max_recent_searches);
        Self {
            config,
            salience,
            history: Mutex::new(history),
            relay: None,
            opener,
        }
    }

    /// Routes searches through a relay first.
    #[must_use]
    pub fn with_relay(mut self, relay: Arc<dyn MessagingTransport>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Recent search terms, most recent first.
    #[must_use]
    pub fn recent_searches(&self) -> Vec<String> {
        self.history.lock().recent()
    }

    /// Normalizes `title`, records it and opens the search.
    pub async fn search(
        &self,
        title: &str,
        gate: Option<&dyn ComplianceGate>,
        options: &SearchOptions,
    ) -> Result<SearchLaunch, ListflowError> {
        if title.trim().is_empty() {
            return Err(ListflowError::InvalidInput("search term is empty".to_string()));
        }

        let term = normalize_term(title, gate, self.salience);
        self.history.lock().record(&term);
        let url = build_search_url(&self.config.search_base_url, &term, options);
        info!(term = %term, url = %url, "Launching target-market search");

        let channel = match self.relay_search(&term).await {
            Ok(()) => LaunchChannel::Relay,
            Err(e) => {
                warn!(error = %e, "Relay search failed, opening directly");
                self.opener.open(&url)?;
                LaunchChannel::Direct
            }
        };

        Ok(SearchLaunch { term, url, channel })
    }

    async fn relay_search(&self, term: &str) -> Result<(), RelayError> {
        let relay = self
            .relay
            .as_ref()
            .ok_or_else(|| RelayError::Unavailable("no relay configured".to_string()))?;
        let message = RelayMessage::SearchTarget {
            keyword: term.to_string(),
        };
        match relay.send(message).await? {
            Some(response) if !response.success => Err(RelayError::Unavailable(
                response
                    .message
                    .unwrap_or_else(|| "relay rejected the search".to_string()),
            )),
            _ => Ok(()),
        }
    }
}
