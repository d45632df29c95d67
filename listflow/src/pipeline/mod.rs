//! The listing pipeline entry point.
//!
//! [`ListingPipeline`] ties the stages together: it classifies the current
//! page, waits for the compliance filter, extracts and gates listing
//! fragments, and exposes the on-demand operations (profitability, target
//! market search, registration). Construct it with [`PipelineBuilder`].

mod builder;
mod integration_tests;
mod report;

pub use builder::PipelineBuilder;
pub use report::{
    BatchReport, FragmentOutcome, ListingOutcome, PageReport, ProcessedFragment,
    RegistrationOutcome,
};

use parking_lot::RwLock;
use scraper::{ElementRef, Html};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::compliance::ComplianceBarrier;
use crate::config::PipelineConfig;
use crate::dispatch::Dispatcher;
use crate::document::{DocumentHost, ProcessingMarks};
use crate::errors::ListflowError;
use crate::extract::{discover_cards, FieldExtractor, FragmentKey};
use crate::listing::ListingRecord;
use crate::market::{extract_target_price, MarketSearch, SearchLaunch, SearchOptions};
use crate::page::{PageContext, PageType};
use crate::present::{NoticeLevel, Presenter};
use crate::profit::{ProfitCalculator, ProfitabilityResult};
use crate::relay::{check_connection, DirectOpener, MessagingTransport};
use crate::watcher::IncrementalWatcher;

/// Extraction, classification and profitability over one live page.
pub struct ListingPipeline {
    config: PipelineConfig,
    extractor: FieldExtractor,
    compliance: ComplianceBarrier,
    calculator: ProfitCalculator,
    presenter: Arc<dyn Presenter>,
    dispatcher: Option<Dispatcher>,
    relay: Option<Arc<dyn MessagingTransport>>,
    market: MarketSearch,
    marks: ProcessingMarks,
    page: RwLock<Option<PageContext>>,
}

impl std::fmt::Debug for ListingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingPipeline")
            .field("page", &*self.page.read())
            .field("compliance", &self.compliance)
            .field("dispatcher", &self.dispatcher)
            .field("marked", &self.marks.len())
            .finish_non_exhaustive()
    }
}

impl ListingPipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: PipelineConfig,
        compliance: ComplianceBarrier,
        presenter: Arc<dyn Presenter>,
        dispatcher: Option<Dispatcher>,
        relay: Option<Arc<dyn MessagingTransport>>,
        opener: Arc<dyn DirectOpener>,
    ) -> Self {
        let mut market = MarketSearch::new(config.market.clone(), config.salience, opener);
        if let Some(relay) = &relay {
            market = market.with_relay(relay.clone());
        }

        Self {
            extractor: FieldExtractor::new(),
            calculator: ProfitCalculator::new(config.profit.clone()),
            compliance,
            presenter,
            dispatcher,
            relay,
            market,
            marks: ProcessingMarks::new(),
            page: RwLock::new(None),
            config,
        }
    }

    /// The frozen configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The compliance barrier.
    #[must_use]
    pub fn compliance(&self) -> &ComplianceBarrier {
        &self.compliance
    }

    /// Processing marks for the current navigation.
    #[must_use]
    pub fn marks(&self) -> &ProcessingMarks {
        &self.marks
    }

    /// The classified current page, once initialized.
    #[must_use]
    pub fn current_page(&self) -> Option<PageContext> {
        self.page.read().clone()
    }

    /// Recent target-market search terms.
    #[must_use]
    pub fn recent_searches(&self) -> Vec<String> {
        self.market.recent_searches()
    }

    /// Initializes the pipeline for a freshly navigated page.
    ///
    /// Checks the relay, classifies the page, awaits the compliance filter and
    /// runs the handler for the page type. Nothing here fails: an absent relay
    /// or filter only degrades what is produced.
    pub async fn initialize(&self, host: &dyn DocumentHost) -> PageReport {
        if let Some(relay) = &self.relay {
            let timeout = self.config.market.connection_check_timeout();
            if !check_connection(relay.as_ref(), timeout).await {
                warn!("Relay is not reachable, direct fallbacks will be used");
            }
        }

        let context = PageContext::from_locator(host.locator());
        info!(
            locator = context.locator(),
            page_type = %context.page_type(),
            "Classified page"
        );
        *self.page.write() = Some(context.clone());
        self.marks.reset();

        self.compliance.ensure_ready().await;

        if context.page_type() == PageType::SearchListing {
            let suppressing = self
                .compliance
                .gate()
                .is_some_and(|gate| gate.should_suppress_blocked());
            self.presenter.show_control_panel(suppressing);
        }

        let report = self.handle_page(&context, host);
        self.presenter
            .notify("Listing tools initialized", NoticeLevel::Info);
        report
    }

    /// Re-runs the handler for the current page.
    ///
    /// Already-marked fragments are skipped, so this only picks up what is new.
    pub async fn reprocess(&self, host: &dyn DocumentHost) -> PageReport {
        let context = self
            .current_page()
            .unwrap_or_else(|| PageContext::from_locator(host.locator()));
        self.compliance.ensure_ready().await;
        info!(locator = context.locator(), "Reprocessing page");
        self.handle_page(&context, host)
    }

    fn handle_page(&self, context: &PageContext, host: &dyn DocumentHost) -> PageReport {
        match context.page_type() {
            PageType::SearchListing => {
                let report = self.process_fragments(&host.snapshot(), context.locator());
                if report.processed > 0 {
                    self.presenter.notify(
                        &format!(
                            "Processed {} listings ({} hidden)",
                            report.processed, report.suppressed
                        ),
                        NoticeLevel::Info,
                    );
                }
                PageReport::Search(report)
            }
            PageType::SingleListing => PageReport::Listing(Box::new(
                self.process_listing_page(&host.snapshot(), context.locator()),
            )),
            PageType::ExternalItem => {
                let document = Html::parse_document(&host.snapshot());
                PageReport::TargetItem(extract_target_price(&document))
            }
            page_type @ (PageType::ExternalSearch | PageType::Unknown) => {
                info!(page_type = %page_type, "No handler for page type, idling");
                PageReport::Idle { page_type }
            }
        }
    }

    /// Processes every unmarked listing fragment in a snapshot, in document order.
    #[must_use]
    pub fn process_fragments(&self, html: &str, locator: &str) -> BatchReport {
        let document = Html::parse_document(html);
        let base = Url::parse(locator).ok();
        let mut report = BatchReport::new();

        for card in discover_cards(&document) {
            report.record(self.process_fragment(&card, base.as_ref()));
        }

        info!(
            batch_id = %report.batch_id,
            scanned = report.scanned,
            processed = report.processed,
            skipped = report.already_processed,
            unextractable = report.unextractable,
            suppressed = report.suppressed,
            "Fragment pass complete"
        );
        report
    }

    /// Processes one fragment unless it is already marked.
    ///
    /// A panic anywhere in extraction, gating or decoration is contained to
    /// this fragment. A mark claimed by the failed attempt is released so a
    /// later pass retries the fragment.
    #[must_use]
    pub fn process_fragment(&self, card: &ElementRef<'_>, base: Option<&Url>) -> FragmentOutcome {
        let key = FragmentKey::for_card(card);
        if self.marks.is_marked(&key) {
            return FragmentOutcome::AlreadyProcessed;
        }

        let claimed = Cell::new(false);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.gate_fragment(&key, card, base, &claimed)
        }));
        outcome.unwrap_or_else(|_| {
            if claimed.get() {
                self.marks.unmark(&key);
            }
            warn!(fragment = %key, "Fragment processing panicked");
            FragmentOutcome::Failed(key)
        })
    }

    fn gate_fragment(
        &self,
        key: &FragmentKey,
        card: &ElementRef<'_>,
        base: Option<&Url>,
        claimed: &Cell<bool>,
    ) -> FragmentOutcome {
        let record = self.extractor.extract_card(card, base);
        if !record.is_extractable() {
            debug!(fragment = %key, "Fragment has no title");
            self.marks.mark(key);
            return FragmentOutcome::Unextractable(key.clone());
        }

        let verdict = self.compliance.verdict(&record);
        let suppressed = self.compliance.should_suppress(verdict.as_ref());
        if !self.marks.mark(key) {
            return FragmentOutcome::AlreadyProcessed;
        }
        claimed.set(true);
        self.presenter
            .decorate_fragment(key, &record, verdict.as_ref(), suppressed);

        FragmentOutcome::Processed(Box::new(ProcessedFragment {
            key: key.clone(),
            record,
            verdict,
            suppressed,
        }))
    }

    /// Extracts and gates a single-listing page.
    #[must_use]
    pub fn process_listing_page(&self, html: &str, locator: &str) -> ListingOutcome {
        let document = Html::parse_document(html);
        let record = self.extractor.extract_listing_page(&document, locator);
        let verdict = self.compliance.verdict(&record);

        let blocked_term_warning = verdict.as_ref().is_some_and(|v| v.is_blocked_term);
        match &verdict {
            Some(v) if v.is_blocked_term => {
                info!(title = %record.title, terms = ?v.matched_terms, "Blocked terms in listing title");
                self.presenter.warn_blocked_terms(&record.title, &v.matched_terms);
            }
            _ => self.presenter.show_listing_controls(&record),
        }

        let blocked_seller_warning = verdict.as_ref().is_some_and(|v| v.is_blocked_seller);
        if blocked_seller_warning {
            info!(seller_id = ?record.seller_id, "Listing is from a blocked seller");
            self.presenter
                .warn_blocked_seller(record.seller_name.as_deref());
        }

        ListingOutcome {
            record,
            verdict,
            blocked_term_warning,
            blocked_seller_warning,
        }
    }

    /// Computes profitability for a record against a target price and shows it.
    pub fn evaluate(&self, record: &ListingRecord, target_price: Option<f64>) -> ProfitabilityResult {
        let result = self.calculator.compute(record.price_value, target_price);
        debug!(
            title = %record.title,
            profit = result.profit,
            rate = result.profit_rate_percent,
            "Evaluated profitability"
        );
        self.presenter.show_profitability(record, &result);
        result
    }

    /// Opens a target-market search for a listing title.
    pub async fn search_target_market(
        &self,
        title: &str,
        options: &SearchOptions,
    ) -> Result<SearchLaunch, ListflowError> {
        self.market
            .search(title, self.compliance.gate(), options)
            .await
    }

    /// Flips compliance suppression. `None` when the filter is unavailable.
    pub fn toggle_suppression(&self) -> Option<bool> {
        let state = self.compliance.toggle_suppression();
        if let Some(suppressing) = state {
            self.presenter.show_control_panel(suppressing);
        }
        state
    }

    /// Registers a record with the inventory endpoint after confirmation.
    pub async fn register(
        &self,
        record: &ListingRecord,
    ) -> Result<RegistrationOutcome, ListflowError> {
        let dispatcher = self
            .dispatcher
            .as_ref()
            .ok_or(ListflowError::NotConfigured("Outbound dispatcher"))?;

        let fallback_url = self
            .current_page()
            .map(|page| page.locator().to_string())
            .unwrap_or_default();
        let payload = dispatcher.payload_for(record, &fallback_url);

        if !self.presenter.confirm_registration(&payload) {
            info!(title = %payload.title, "Registration cancelled");
            return Ok(RegistrationOutcome::Cancelled);
        }

        match dispatcher.dispatch(&payload).await {
            Ok(receipt) => {
                if receipt.success {
                    self.presenter
                        .notify("Registered with the inventory service", NoticeLevel::Success);
                } else {
                    let reason = receipt.message.as_deref().unwrap_or("unknown error");
                    self.presenter
                        .notify(&format!("Registration failed: {reason}"), NoticeLevel::Error);
                }
                Ok(RegistrationOutcome::Submitted(receipt))
            }
            Err(e) => {
                self.presenter.notify(
                    &format!("Registration failed: {}", e.user_message()),
                    NoticeLevel::Error,
                );
                Err(e.into())
            }
        }
    }

    /// Arms an incremental watcher over a live document.
    #[must_use]
    pub fn watch(self: &Arc<Self>, host: Arc<dyn DocumentHost>) -> Arc<IncrementalWatcher> {
        Arc::new(IncrementalWatcher::new(
            Arc::clone(self),
            host,
            &self.config.watcher,
        ))
    }

    /// Initializes the pipeline and, on search pages, arms a watcher.
    pub async fn start(
        self: &Arc<Self>,
        host: Arc<dyn DocumentHost>,
    ) -> (PageReport, Option<Arc<IncrementalWatcher>>) {
        let report = self.initialize(host.as_ref()).await;
        let watcher = matches!(report, PageReport::Search(_)).then(|| self.watch(host));
        (report, watcher)
    }
}
