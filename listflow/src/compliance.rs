//! Compliance gate over an external blocklist filter.
//!
//! The filter itself lives outside this crate and is consumed through the
//! [`ComplianceGate`] trait. [`ComplianceBarrier`] wraps it with the one-time
//! initialization barrier and turns records into [`ComplianceVerdict`]s. A
//! filter that failed to initialize yields no verdicts; it never blocks
//! extraction and never suppresses anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::ListflowError;
use crate::listing::ListingRecord;

/// External blocklist filter.
///
/// `initialize` is awaited once before any query. Every other method is a
/// synchronous lookup against the loaded blocklist.
#[async_trait]
pub trait ComplianceGate: Send + Sync {
    /// Loads the blocklist.
    async fn initialize(&self) -> Result<(), ListflowError>;

    /// Whether the text contains any blocked term.
    fn contains_blocked_term(&self, text: &str) -> bool;

    /// All blocked terms found in the text.
    fn find_blocked_terms(&self, text: &str) -> BTreeSet<String>;

    /// Whether the seller id is blocklisted.
    fn is_blocked_seller(&self, seller_id: &str) -> bool;

    /// Whether blocked listings should currently be hidden.
    fn should_suppress_blocked(&self) -> bool;

    /// Flips the suppression toggle and returns the new value.
    fn toggle_suppression(&self) -> bool;

    /// Removes blocked terms from the text.
    fn remove_blocked_terms(&self, text: &str) -> String;
}

/// Compliance annotations for one record. Never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    /// The title contains at least one blocked term.
    pub is_blocked_term: bool,
    /// The blocked terms found in the title.
    pub matched_terms: BTreeSet<String>,
    /// The seller is blocklisted.
    pub is_blocked_seller: bool,
}

impl ComplianceVerdict {
    /// Whether any rule matched.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_blocked_term || self.is_blocked_seller
    }
}

/// Initialization barrier and verdict source around a [`ComplianceGate`].
#[derive(Clone)]
pub struct ComplianceBarrier {
    gate: Option<Arc<dyn ComplianceGate>>,
    ready: Arc<OnceCell<bool>>,
}

impl std::fmt::Debug for ComplianceBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceBarrier")
            .field("configured", &self.gate.is_some())
            .field("ready", &self.ready.get())
            .finish()
    }
}

impl ComplianceBarrier {
    /// Wraps a gate.
    #[must_use]
    pub fn new(gate: Arc<dyn ComplianceGate>) -> Self {
        Self {
            gate: Some(gate),
            ready: Arc::new(OnceCell::new()),
        }
    }

    /// A barrier with no filter behind it. Produces no verdicts.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            gate: None,
            ready: Arc::new(OnceCell::new()),
        }
    }

    /// Awaits filter initialization. Runs at most once; later calls return
    /// the first outcome.
    pub async fn ensure_ready(&self) -> bool {
        let Some(gate) = self.gate.clone() else {
            return false;
        };
        *self
            .ready
            .get_or_init(|| async move {
                match gate.initialize().await {
                    Ok(()) => {
                        debug!("Compliance filter initialized");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "Compliance filter unavailable, continuing without verdicts");
                        false
                    }
                }
            })
            .await
    }

    /// Whether initialization finished successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get().copied().unwrap_or(false)
    }

    /// The gate, if it is ready for queries.
    #[must_use]
    pub fn gate(&self) -> Option<&dyn ComplianceGate> {
        if self.is_ready() {
            self.gate.as_deref()
        } else {
            None
        }
    }

    /// Computes a verdict for a record, or `None` when the filter is not ready.
    #[must_use]
    pub fn verdict(&self, record: &ListingRecord) -> Option<ComplianceVerdict> {
        let gate = self.gate()?;
        let matched_terms = gate.find_blocked_terms(&record.title);
        Some(ComplianceVerdict {
            is_blocked_term: !matched_terms.is_empty() || gate.contains_blocked_term(&record.title),
            matched_terms,
            is_blocked_seller: record
                .seller_id
                .as_deref()
                .is_some_and(|id| gate.is_blocked_seller(id)),
        })
    }

    /// Whether a record with this verdict should be hidden right now.
    #[must_use]
    pub fn should_suppress(&self, verdict: Option<&ComplianceVerdict>) -> bool {
        match (self.gate(), verdict) {
            (Some(gate), Some(verdict)) => verdict.is_blocked() && gate.should_suppress_blocked(),
            _ => false,
        }
    }

    /// Flips the filter's suppression toggle. `None` when the filter is not ready.
    pub fn toggle_suppression(&self) -> Option<bool> {
        self.gate().map(|gate| gate.toggle_suppression())
    }
}
