//! Page classification.
//!
//! Maps a locator to a [`PageType`] by walking an ordered table of substring
//! patterns. The first row with a matching pattern wins and anything else is
//! [`PageType::Unknown`], so classification is total.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of page a locator points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Source marketplace search or category results.
    SearchListing,
    /// A single source marketplace item.
    SingleListing,
    /// Target marketplace search results.
    ExternalSearch,
    /// A single target marketplace product.
    ExternalItem,
    /// Anything else.
    Unknown,
}

impl PageType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SearchListing => "search_listing",
            Self::SingleListing => "single_listing",
            Self::ExternalSearch => "external_search",
            Self::ExternalItem => "external_item",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered classification table, evaluated top to bottom.
const PAGE_PATTERNS: &[(&[&str], PageType)] = &[
    (
        &["jp.mercari.com/search", "jp.mercari.com/category"],
        PageType::SearchListing,
    ),
    (&["jp.mercari.com/item/"], PageType::SingleListing),
    (&["amazon.co.jp/s"], PageType::ExternalSearch),
    (
        &["amazon.co.jp/dp/", "amazon.co.jp/gp/product/"],
        PageType::ExternalItem,
    ),
];

/// Classifies a locator.
#[must_use]
pub fn classify(locator: &str) -> PageType {
    PAGE_PATTERNS
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| locator.contains(p)))
        .map_or(PageType::Unknown, |(_, page_type)| *page_type)
}

/// The classified page for one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    locator: String,
    page_type: PageType,
}

impl PageContext {
    /// Classifies a locator and captures the result.
    #[must_use]
    pub fn from_locator(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let page_type = classify(&locator);
        Self { locator, page_type }
    }

    /// The locator this context was derived from.
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// The classified page type.
    #[must_use]
    pub const fn page_type(&self) -> PageType {
        self.page_type
    }
}
