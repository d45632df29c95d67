//! Presentation seam.
//!
//! The pipeline never renders anything itself. It hands records, verdicts and
//! profitability results to a [`Presenter`], which owns buttons, panels and
//! notices and makes no decisions of its own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn, Level};

use crate::compliance::ComplianceVerdict;
use crate::dispatch::OutboundPayload;
use crate::extract::FragmentKey;
use crate::listing::ListingRecord;
use crate::profit::ProfitabilityResult;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something succeeded.
    Success,
    /// Something failed.
    Error,
}

/// Receives pipeline output for display.
pub trait Presenter: Send + Sync {
    /// Shows the search-page control panel with the current suppression state.
    fn show_control_panel(&self, suppressing_blocked: bool);

    /// Attaches per-card controls and compliance styling to a fragment.
    fn decorate_fragment(
        &self,
        key: &FragmentKey,
        record: &ListingRecord,
        verdict: Option<&ComplianceVerdict>,
        suppressed: bool,
    );

    /// Shows the search and register controls on an item page.
    fn show_listing_controls(&self, record: &ListingRecord);

    /// Shows a blocked-term warning in place of item controls.
    fn warn_blocked_terms(&self, title: &str, terms: &BTreeSet<String>);

    /// Shows a blocked-seller warning.
    fn warn_blocked_seller(&self, seller_name: Option<&str>);

    /// Shows a profitability verdict.
    fn show_profitability(&self, record: &ListingRecord, result: &ProfitabilityResult);

    /// Asks whether a payload should be registered.
    fn confirm_registration(&self, _payload: &OutboundPayload) -> bool {
        true
    }

    /// Shows a transient notice.
    fn notify(&self, message: &str, level: NoticeLevel);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPresenter;

impl Presenter for NoOpPresenter {
    fn show_control_panel(&self, _suppressing_blocked: bool) {}

    fn decorate_fragment(
        &self,
        _key: &FragmentKey,
        _record: &ListingRecord,
        _verdict: Option<&ComplianceVerdict>,
        _suppressed: bool,
    ) {
    }

    fn show_listing_controls(&self, _record: &ListingRecord) {}

    fn warn_blocked_terms(&self, _title: &str, _terms: &BTreeSet<String>) {}

    fn warn_blocked_seller(&self, _seller_name: Option<&str>) {}

    fn show_profitability(&self, _record: &ListingRecord, _result: &ProfitabilityResult) {}

    fn notify(&self, _message: &str, _level: NoticeLevel) {}
}

/// Writes presentation requests to the tracing log.
#[derive(Debug, Clone)]
pub struct LoggingPresenter {
    level: Level,
}

impl Default for LoggingPresenter {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingPresenter {
    /// Creates a presenter logging at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level presenter.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log(&self, what: &str, detail: &str) {
        if self.level == Level::DEBUG {
            debug!(presenter = what, detail, "Presenting {}", what);
        } else {
            info!(presenter = what, detail, "Presenting {}", what);
        }
    }
}

impl Presenter for LoggingPresenter {
    fn show_control_panel(&self, suppressing_blocked: bool) {
        self.log("control_panel", &format!("suppressing_blocked={suppressing_blocked}"));
    }

    fn decorate_fragment(
        &self,
        key: &FragmentKey,
        record: &ListingRecord,
        verdict: Option<&ComplianceVerdict>,
        suppressed: bool,
    ) {
        let blocked = verdict.is_some_and(ComplianceVerdict::is_blocked);
        self.log(
            "fragment",
            &format!("{key} title={:?} blocked={blocked} suppressed={suppressed}", record.title),
        );
    }

    fn show_listing_controls(&self, record: &ListingRecord) {
        self.log("listing_controls", &record.title);
    }

    fn warn_blocked_terms(&self, title: &str, terms: &BTreeSet<String>) {
        let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
        warn!(title, terms = %terms.join(", "), "Listing title contains blocked terms");
    }

    fn warn_blocked_seller(&self, seller_name: Option<&str>) {
        warn!(seller = seller_name.unwrap_or("unknown"), "Listing is from a blocked seller");
    }

    fn show_profitability(&self, record: &ListingRecord, result: &ProfitabilityResult) {
        self.log(
            "profitability",
            &format!("{} -> {}", record.title, result.verdict_message),
        );
    }

    fn notify(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Error => warn!(notice = message, "Notice"),
            NoticeLevel::Info | NoticeLevel::Success => self.log("notice", message),
        }
    }
}
