//! # Listflow
//!
//! Resilient listing extraction, compliance tagging and resale profitability
//! for marketplace pages.
//!
//! Listflow observes a live marketplace page and provides:
//!
//! - **Page classification**: ordered locator patterns map to a page type
//! - **Resilient extraction**: per-field strategy tables with structural fallbacks
//! - **Compliance gating**: verdicts from an external blocklist filter
//! - **Incremental processing**: a debounced watcher that only touches new fragments
//! - **Profitability**: a fee model over source and target prices
//! - **Outbound dispatch**: registration with bounded retries and per-attempt timeouts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listflow::prelude::*;
//!
//! let pipeline = Arc::new(
//!     ListingPipeline::builder(PipelineConfig::default())
//!         .compliance(gate)
//!         .transport(Arc::new(ReqwestTransport::new()))
//!         .build(),
//! );
//!
//! let (report, watcher) = pipeline.start(host).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod compliance;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod errors;
pub mod extract;
pub mod listing;
pub mod market;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod present;
pub mod profit;
pub mod relay;
pub mod telemetry;
pub mod testing;
pub mod watcher;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compliance::{ComplianceBarrier, ComplianceGate, ComplianceVerdict};
    pub use crate::config::{
        DispatchConfig, MarketSearchConfig, PipelineConfig, ProfitConfig, SalienceConfig,
        WatcherConfig,
    };
    pub use crate::dispatch::{
        DispatchReceipt, Dispatcher, HttpResponse, HttpTransport, OutboundPayload, RetryPolicy,
    };
    #[cfg(feature = "http")]
    pub use crate::dispatch::ReqwestTransport;
    pub use crate::document::{DocumentHost, MutationRecord};
    pub use crate::errors::{DispatchError, ListflowError, RelayError, TransportError};
    pub use crate::extract::{FieldExtractor, FragmentKey};
    pub use crate::listing::ListingRecord;
    pub use crate::market::{SearchLaunch, SearchOptions, TargetPrice};
    pub use crate::normalize::normalize_term;
    pub use crate::page::{classify, PageContext, PageType};
    pub use crate::pipeline::{
        BatchReport, ListingOutcome, ListingPipeline, PageReport, PipelineBuilder,
        RegistrationOutcome,
    };
    pub use crate::present::{LoggingPresenter, NoOpPresenter, NoticeLevel, Presenter};
    pub use crate::profit::{ProfitCalculator, ProfitabilityResult};
    pub use crate::relay::{DirectOpener, MessagingTransport, RelayMessage, RelayResponse};
    pub use crate::telemetry::{init_tracing, LogFormat};
    pub use crate::watcher::{IncrementalWatcher, SignalOutcome, WatcherState};
    pub use std::sync::Arc;
}
