//! Price extraction from target-market product pages.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::extract::element_text;
use crate::listing::parse_price;

const CURRENT_PRICE: &str = "#priceblock_ourprice, .a-price .a-offscreen";
const ORIGINAL_PRICE: &str = ".a-text-price .a-offscreen";

/// Prices shown on a target-market product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPrice {
    /// Current selling price.
    pub current: Option<f64>,
    /// List price before discount.
    pub original: Option<f64>,
    /// Whole-percent discount of current versus original.
    pub discount_percent: Option<i64>,
    /// Currency mark.
    pub currency: String,
}

impl Default for TargetPrice {
    fn default() -> Self {
        Self {
            current: None,
            original: None,
            discount_percent: None,
            currency: "¥".to_string(),
        }
    }
}

fn first_price(document: &Html, selector: &str) -> Option<f64> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| parse_price(&element_text(&el)))
}

/// Reads current and original prices and derives the discount.
#[must_use]
pub fn extract_target_price(document: &Html) -> TargetPrice {
    let current = first_price(document, CURRENT_PRICE);
    let original = first_price(document, ORIGINAL_PRICE);

    let discount_percent = match (current, original) {
        (Some(cur), Some(orig)) if cur != 0.0 && orig != 0.0 => {
            Some(((1.0 - cur / orig) * 100.0 + 0.5).floor() as i64)
        }
        _ => None,
    };

    TargetPrice {
        current,
        original,
        discount_percent,
        ..TargetPrice::default()
    }
}
