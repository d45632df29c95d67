//! Results reported by pipeline passes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::ComplianceVerdict;
use crate::dispatch::DispatchReceipt;
use crate::extract::FragmentKey;
use crate::listing::ListingRecord;
use crate::market::TargetPrice;
use crate::page::PageType;

/// One fragment that went through extraction and the compliance gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFragment {
    /// Fragment identity.
    pub key: FragmentKey,
    /// Extracted record.
    pub record: ListingRecord,
    /// Compliance verdict, absent when the filter is unavailable.
    pub verdict: Option<ComplianceVerdict>,
    /// Whether the presenter was told to hide the fragment.
    pub suppressed: bool,
}

/// What happened to a single fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentOutcome {
    /// Marked in an earlier pass; nothing was done.
    AlreadyProcessed,
    /// No title could be extracted. Marked, not decorated.
    Unextractable(FragmentKey),
    /// Extracted, gated and decorated.
    Processed(Box<ProcessedFragment>),
    /// Processing panicked. Not marked, so a later pass retries it.
    Failed(FragmentKey),
}

/// Summary of one pass over the listing fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique id of the pass.
    pub batch_id: Uuid,
    /// Fragments discovered in the snapshot.
    pub scanned: usize,
    /// Fragments processed in this pass.
    pub processed: usize,
    /// Fragments skipped because they were already marked.
    pub already_processed: usize,
    /// Fragments without a title.
    pub unextractable: usize,
    /// Fragments whose processing panicked.
    pub failed: usize,
    /// Processed fragments that were suppressed.
    pub suppressed: usize,
    /// The processed fragments in document order.
    pub fragments: Vec<ProcessedFragment>,
}

impl BatchReport {
    /// Creates an empty report with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            scanned: 0,
            processed: 0,
            already_processed: 0,
            unextractable: 0,
            failed: 0,
            suppressed: 0,
            fragments: Vec::new(),
        }
    }

    /// Adds one fragment outcome.
    pub fn record(&mut self, outcome: FragmentOutcome) {
        self.scanned += 1;
        match outcome {
            FragmentOutcome::AlreadyProcessed => self.already_processed += 1,
            FragmentOutcome::Unextractable(_) => self.unextractable += 1,
            FragmentOutcome::Failed(_) => self.failed += 1,
            FragmentOutcome::Processed(fragment) => {
                self.processed += 1;
                if fragment.suppressed {
                    self.suppressed += 1;
                }
                self.fragments.push(*fragment);
            }
        }
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of processing a single-listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingOutcome {
    /// The extracted record.
    pub record: ListingRecord,
    /// Compliance verdict, absent when the filter is unavailable.
    pub verdict: Option<ComplianceVerdict>,
    /// A blocked-term warning replaced the item controls.
    pub blocked_term_warning: bool,
    /// A blocked-seller warning was shown.
    pub blocked_seller_warning: bool,
}

/// What a page-level pass did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageReport {
    /// A search-listing page was scanned.
    Search(BatchReport),
    /// A single-listing page was processed.
    Listing(Box<ListingOutcome>),
    /// Prices were read from a target-market product page.
    TargetItem(TargetPrice),
    /// Nothing to do for this page type.
    Idle {
        /// The classified page type.
        page_type: PageType,
    },
}

/// Outcome of the registration flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// The presenter declined the confirmation.
    Cancelled,
    /// The endpoint accepted the request.
    Submitted(DispatchReceipt),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(suppressed: bool) -> FragmentOutcome {
        FragmentOutcome::Processed(Box::new(ProcessedFragment {
            key: FragmentKey::for_path(&[0]),
            record: ListingRecord::new().with_title("t"),
            verdict: None,
            suppressed,
        }))
    }

    #[test]
    fn test_batch_counts() {
        let mut report = BatchReport::new();
        report.record(processed(false));
        report.record(processed(true));
        report.record(FragmentOutcome::AlreadyProcessed);
        report.record(FragmentOutcome::Unextractable(FragmentKey::for_path(&[1])));
        report.record(FragmentOutcome::Failed(FragmentKey::for_path(&[2])));

        assert_eq!(report.scanned, 5);
        assert_eq!(report.processed, 2);
        assert_eq!(report.suppressed, 1);
        assert_eq!(report.already_processed, 1);
        assert_eq!(report.unextractable, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fragments.len(), 2);
    }

    #[test]
    fn test_page_report_serializes_with_kind_tag() {
        let report = PageReport::Idle {
            page_type: PageType::Unknown,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"kind": "idle", "page_type": "unknown"})
        );
    }
}
