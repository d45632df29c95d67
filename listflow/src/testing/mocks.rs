//! Test doubles for the pipeline's collaborator seams.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::compliance::{ComplianceGate, ComplianceVerdict};
use crate::dispatch::{HttpResponse, HttpTransport, OutboundPayload};
use crate::document::DocumentHost;
use crate::errors::{ListflowError, RelayError, TransportError};
use crate::extract::FragmentKey;
use crate::listing::ListingRecord;
use crate::present::{NoticeLevel, Presenter};
use crate::profit::ProfitabilityResult;
use crate::relay::DirectOpener;

/// A compliance filter over fixed term and seller lists.
///
/// Terms match case-insensitively as substrings. Suppression starts enabled.
#[derive(Debug)]
pub struct StaticComplianceGate {
    terms: Vec<String>,
    sellers: HashSet<String>,
    suppress: AtomicBool,
    fail_init: bool,
    init_count: AtomicUsize,
}

impl Default for StaticComplianceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticComplianceGate {
    /// An empty blocklist.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            sellers: HashSet::new(),
            suppress: AtomicBool::new(true),
            fail_init: false,
            init_count: AtomicUsize::new(0),
        }
    }

    /// Adds blocked terms.
    #[must_use]
    pub fn with_blocked_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Adds blocked seller ids.
    #[must_use]
    pub fn with_blocked_sellers<I, S>(mut self, sellers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sellers.extend(sellers.into_iter().map(Into::into));
        self
    }

    /// Sets the initial suppression state.
    #[must_use]
    pub fn with_suppression(self, suppress: bool) -> Self {
        self.suppress.store(suppress, Ordering::SeqCst);
        self
    }

    /// Makes `initialize` fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// How many times `initialize` ran.
    pub fn initialize_count(&self) -> usize {
        self.init_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComplianceGate for StaticComplianceGate {
    async fn initialize(&self) -> Result<(), ListflowError> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(ListflowError::ComplianceUnavailable(
                "blocklist failed to load".to_string(),
            ));
        }
        Ok(())
    }

    fn contains_blocked_term(&self, text: &str) -> bool {
        !self.find_blocked_terms(text).is_empty()
    }

    fn find_blocked_terms(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| haystack.contains(&term.to_lowercase()))
            .cloned()
            .collect()
    }

    fn is_blocked_seller(&self, seller_id: &str) -> bool {
        self.sellers.contains(seller_id)
    }

    fn should_suppress_blocked(&self) -> bool {
        self.suppress.load(Ordering::SeqCst)
    }

    fn toggle_suppression(&self) -> bool {
        !self.suppress.fetch_xor(true, Ordering::SeqCst)
    }

    fn remove_blocked_terms(&self, text: &str) -> String {
        self.terms
            .iter()
            .fold(text.to_string(), |acc, term| acc.replace(term.as_str(), " "))
    }
}

enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
    Hang,
}

impl Reply {
    fn duplicate(&self) -> Self {
        match self {
            Self::Respond(response) => Self::Respond(response.clone()),
            Self::Fail(error) => Self::Fail(error.clone()),
            Self::Hang => Self::Hang,
        }
    }
}

/// An HTTP transport that plays back a fixed script of replies.
///
/// Once the script runs out the last reply repeats; an empty script answers
/// `200 {"success": true}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<(String, OutboundPayload)>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("remaining", &self.script.lock().len())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl ScriptedTransport {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    #[must_use]
    pub fn then_respond(self, status: u16, body: &str) -> Self {
        self.script
            .lock()
            .push_back(Reply::Respond(HttpResponse::new(status, body)));
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn then_fail(self, error: TransportError) -> Self {
        self.script.lock().push_back(Reply::Fail(error));
        self
    }

    /// Queues a call that never completes.
    #[must_use]
    pub fn then_hang(self) -> Self {
        self.script.lock().push_back(Reply::Hang);
        self
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every `(url, payload)` sent so far.
    pub fn requests(&self) -> Vec<(String, OutboundPayload)> {
        self.requests.lock().clone()
    }

    fn next_reply(&self) -> Reply {
        if let Some(reply) = self.script.lock().pop_front() {
            *self.last.lock() = Some(reply.duplicate());
            return reply;
        }
        self.last.lock().as_ref().map_or_else(
            || Reply::Respond(HttpResponse::new(200, r#"{"success": true}"#)),
            Reply::duplicate,
        )
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        payload: &OutboundPayload,
    ) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .push((url.to_string(), payload.clone()));

        match self.next_reply() {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(error) => Err(error),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// One call received by a [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    /// `show_control_panel`.
    ControlPanel(bool),
    /// `decorate_fragment`.
    Decorated {
        /// Fragment identity.
        key: FragmentKey,
        /// Title of the record.
        title: String,
        /// Whether a blocking rule matched.
        blocked: bool,
        /// Whether the fragment was hidden.
        suppressed: bool,
    },
    /// `show_listing_controls`.
    ListingControls(String),
    /// `warn_blocked_terms`.
    BlockedTerms(BTreeSet<String>),
    /// `warn_blocked_seller`.
    BlockedSeller(Option<String>),
    /// `show_profitability`.
    Profitability(ProfitabilityResult),
    /// `confirm_registration`.
    Confirmation(String),
    /// `notify`.
    Notice(String, NoticeLevel),
}

/// A presenter that records every call.
#[derive(Debug)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
    confirm: bool,
    panic_on: Mutex<Option<FragmentKey>>,
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPresenter {
    /// A presenter that confirms every registration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm: true,
            panic_on: Mutex::new(None),
        }
    }

    /// A presenter whose first decoration of `key` panics.
    #[must_use]
    pub fn panicking_once_on(key: FragmentKey) -> Self {
        Self {
            panic_on: Mutex::new(Some(key)),
            ..Self::new()
        }
    }

    /// A presenter that declines every registration.
    #[must_use]
    pub fn declining() -> Self {
        Self {
            confirm: false,
            ..Self::new()
        }
    }

    /// Every recorded call in order.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().clone()
    }

    /// The `(key, suppressed)` pairs of every decorated fragment.
    pub fn decorated(&self) -> Vec<(FragmentKey, bool)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Decorated {
                    key, suppressed, ..
                } => Some((key.clone(), *suppressed)),
                _ => None,
            })
            .collect()
    }

    /// Every notice message with its level.
    pub fn notices(&self) -> Vec<(String, NoticeLevel)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Notice(message, level) => Some((message.clone(), *level)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: PresenterEvent) {
        self.events.lock().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn show_control_panel(&self, suppressing_blocked: bool) {
        self.push(PresenterEvent::ControlPanel(suppressing_blocked));
    }

    fn decorate_fragment(
        &self,
        key: &FragmentKey,
        record: &ListingRecord,
        verdict: Option<&ComplianceVerdict>,
        suppressed: bool,
    ) {
        let trip = {
            let mut panic_on = self.panic_on.lock();
            if panic_on.as_ref() == Some(key) {
                panic_on.take();
                true
            } else {
                false
            }
        };
        if trip {
            panic!("decoration failed for {key}");
        }
        self.push(PresenterEvent::Decorated {
            key: key.clone(),
            title: record.title.clone(),
            blocked: verdict.is_some_and(ComplianceVerdict::is_blocked),
            suppressed,
        });
    }

    fn show_listing_controls(&self, record: &ListingRecord) {
        self.push(PresenterEvent::ListingControls(record.title.clone()));
    }

    fn warn_blocked_terms(&self, _title: &str, terms: &BTreeSet<String>) {
        self.push(PresenterEvent::BlockedTerms(terms.clone()));
    }

    fn warn_blocked_seller(&self, seller_name: Option<&str>) {
        self.push(PresenterEvent::BlockedSeller(seller_name.map(str::to_string)));
    }

    fn show_profitability(&self, _record: &ListingRecord, result: &ProfitabilityResult) {
        self.push(PresenterEvent::Profitability(result.clone()));
    }

    fn confirm_registration(&self, payload: &OutboundPayload) -> bool {
        self.push(PresenterEvent::Confirmation(payload.title.clone()));
        self.confirm
    }

    fn notify(&self, message: &str, level: NoticeLevel) {
        self.push(PresenterEvent::Notice(message.to_string(), level));
    }
}

/// A document held in memory. The markup can be swapped to simulate mutation.
#[derive(Debug)]
pub struct InMemoryDocument {
    locator: RwLock<String>,
    html: RwLock<String>,
}

impl InMemoryDocument {
    /// Creates a document.
    #[must_use]
    pub fn new(locator: &str, html: &str) -> Self {
        Self {
            locator: RwLock::new(locator.to_string()),
            html: RwLock::new(html.to_string()),
        }
    }

    /// Replaces the markup.
    pub fn set_html(&self, html: &str) {
        *self.html.write() = html.to_string();
    }

    /// Simulates a navigation.
    pub fn navigate(&self, locator: &str, html: &str) {
        *self.locator.write() = locator.to_string();
        self.set_html(html);
    }
}

impl DocumentHost for InMemoryDocument {
    fn locator(&self) -> String {
        self.locator.read().clone()
    }

    fn snapshot(&self) -> String {
        self.html.read().clone()
    }
}

/// A direct opener that records every URL.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingOpener {
    /// An opener whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// URLs opened so far.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl DirectOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), RelayError> {
        if self.fail {
            return Err(RelayError::Direct("popup blocked".to_string()));
        }
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_static_gate_toggle_returns_new_value() {
        let gate = StaticComplianceGate::new();
        assert!(gate.should_suppress_blocked());
        assert!(!gate.toggle_suppression());
        assert!(gate.toggle_suppression());
    }

    #[test]
    fn test_failing_gate_counts_attempts() {
        let gate = StaticComplianceGate::new().failing();
        assert!(tokio_test::block_on(gate.initialize()).is_err());
        assert_eq!(gate.initialize_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_transport_repeats_last_reply() {
        let transport = ScriptedTransport::new().then_respond(500, "");
        let payload = OutboundPayload::from_record(&ListingRecord::new(), "mercari", "");
        for _ in 0..2 {
            let response = transport.post_json("http://x", &payload).await.unwrap();
            assert_eq!(response.status, 500);
        }
        assert_eq!(transport.call_count(), 2);
    }
}
