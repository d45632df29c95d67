//! Listing records and price parsing.

use serde::{Deserialize, Serialize};

/// Normalized representation of one marketplace item.
///
/// Produced by the field extractor. Every field defaults to empty/absent when
/// no strategy matched; a record with an empty title is unextractable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Item identifier parsed from the item link.
    pub id: Option<String>,
    /// Item title as shown on the page.
    #[serde(default)]
    pub title: String,
    /// Price text as shown on the page, e.g. `¥1,980`.
    #[serde(default)]
    pub price_raw: String,
    /// Numeric price parsed from `price_raw`.
    pub price_value: Option<f64>,
    /// Absolute URL of the item.
    #[serde(default)]
    pub url: String,
    /// Image URLs in page order.
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Seller display name.
    pub seller_name: Option<String>,
    /// Seller identifier parsed from the seller link.
    pub seller_id: Option<String>,
    /// Item condition label.
    pub condition: Option<String>,
    /// Item description.
    pub description: Option<String>,
}

impl ListingRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the raw price and derives the numeric value from it.
    #[must_use]
    pub fn with_price(mut self, price_raw: impl Into<String>) -> Self {
        self.price_raw = price_raw.into();
        self.price_value = parse_price(&self.price_raw);
        self
    }

    /// Sets the seller.
    #[must_use]
    pub fn with_seller(mut self, name: impl Into<String>, id: Option<String>) -> Self {
        self.seller_name = Some(name.into());
        self.seller_id = id;
        self
    }

    /// Whether the record carries enough data for downstream stages.
    #[must_use]
    pub fn is_extractable(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Parses a displayed price into a number.
///
/// Every character other than digits, `.` and `,` is dropped, commas are
/// removed, and the longest leading decimal prefix is parsed. Returns `None`
/// when no digits survive.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in cleaned.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + 1;
    }

    if !seen_digit {
        return None;
    }
    let number = cleaned[..end].trim_end_matches('.');
    if number.starts_with('.') {
        format!("0{number}").parse().ok()
    } else {
        number.parse().ok()
    }
}
