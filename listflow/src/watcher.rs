//! Debounced incremental re-processing under live document mutation.
//!
//! The watcher is a two-state machine. A mutation signal that touches one of
//! the listing-container regions moves it from [`WatcherState::Idle`] to
//! [`WatcherState::BatchInFlight`] and schedules one batch: wait the settle
//! delay, snapshot the document, process every unmarked fragment, return to
//! idle. Signals that arrive while a batch is in flight are dropped; the next
//! signal after it finishes triggers a fresh full scan.

use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::WatcherConfig;
use crate::document::{DocumentHost, MutationRecord};
use crate::pipeline::{BatchReport, ListingPipeline};

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Waiting for a relevant mutation.
    Idle,
    /// A batch is scheduled or running.
    BatchInFlight,
}

/// What a mutation signal led to.
#[derive(Debug)]
pub enum SignalOutcome {
    /// No mutated node lies within a listing container.
    Ignored,
    /// A batch was already in flight.
    Dropped,
    /// A new batch was scheduled.
    Scheduled(JoinHandle<BatchReport>),
}

impl SignalOutcome {
    /// Whether a batch was scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }
}

/// Resets the in-flight flag when a batch ends, however it ends.
struct InFlightGuard(Arc<IncrementalWatcher>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Re-runs fragment processing when the listing containers change.
pub struct IncrementalWatcher {
    pipeline: Arc<ListingPipeline>,
    host: Arc<dyn DocumentHost>,
    containers: Vec<Selector>,
    settle_delay: Duration,
    in_flight: AtomicBool,
    batches: AtomicU64,
}

impl std::fmt::Debug for IncrementalWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalWatcher")
            .field("state", &self.state())
            .field("settle_delay", &self.settle_delay)
            .field("containers", &self.containers.len())
            .field("batches", &self.batches_run())
            .finish_non_exhaustive()
    }
}

impl IncrementalWatcher {
    /// Creates a watcher. Invalid container selectors are logged and skipped.
    #[must_use]
    pub fn new(
        pipeline: Arc<ListingPipeline>,
        host: Arc<dyn DocumentHost>,
        config: &WatcherConfig,
    ) -> Self {
        let containers = config
            .container_selectors
            .iter()
            .filter_map(|source| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!(selector = %source, error = %e, "Skipping invalid container selector");
                    None
                }
            })
            .collect();

        Self {
            pipeline,
            host,
            containers,
            settle_delay: config.settle_delay(),
            in_flight: AtomicBool::new(false),
            batches: AtomicU64::new(0),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        if self.in_flight.load(Ordering::SeqCst) {
            WatcherState::BatchInFlight
        } else {
            WatcherState::Idle
        }
    }

    /// Number of batches that ran to completion.
    #[must_use]
    pub fn batches_run(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Handles one mutation signal.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime and the signal schedules a
    /// batch, because the debounce timer is spawned onto the current runtime.
    pub fn on_mutations(self: &Arc<Self>, mutations: &[MutationRecord]) -> SignalOutcome {
        if self.in_flight.load(Ordering::SeqCst) {
            debug!("Batch in flight, dropping mutation signal");
            return SignalOutcome::Dropped;
        }
        if !self.touches_container(mutations) {
            return SignalOutcome::Ignored;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SignalOutcome::Dropped;
        }

        let guard = InFlightGuard(Arc::clone(self));
        SignalOutcome::Scheduled(tokio::spawn(async move {
            let watcher = &guard.0;
            tokio::time::sleep(watcher.settle_delay).await;

            let locator = watcher.host.locator();
            let report = watcher
                .pipeline
                .process_fragments(&watcher.host.snapshot(), &locator);
            watcher.batches.fetch_add(1, Ordering::SeqCst);
            debug!(batch_id = %report.batch_id, "Watcher batch finished");
            drop(guard);
            report
        }))
    }

    fn touches_container(&self, mutations: &[MutationRecord]) -> bool {
        if mutations.is_empty() || self.containers.is_empty() {
            return false;
        }
        let document = Html::parse_document(&self.host.snapshot());

        mutations.iter().any(|mutation| {
            let Ok(target) = Selector::parse(&mutation.target) else {
                debug!(target = %mutation.target, "Unparsable mutation target");
                return false;
            };
            document.select(&target).any(|node| {
                let within = |el: &scraper::ElementRef<'_>| {
                    self.containers.iter().any(|container| container.matches(el))
                };
                within(&node)
                    || node
                        .ancestors()
                        .filter_map(scraper::ElementRef::wrap)
                        .any(|ancestor| within(&ancestor))
            })
        })
    }
}
