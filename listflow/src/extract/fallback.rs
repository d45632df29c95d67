//! Heuristics applied when every strategy for a card field misses.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

use super::strategy::{element_text, has_currency_mark};

const TITLE_CANDIDATES: &str = "h3, h4, p, div";
const MIN_TITLE_CHARS: usize = 5;

fn title_candidates() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR
        .get_or_init(|| Selector::parse(TITLE_CANDIDATES).ok())
        .as_ref()
}

fn price_token() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[¥￥]\s*[,\d]+").ok())
        .as_ref()
}

/// First descendant text longer than five characters that is not a price.
#[must_use]
pub fn fallback_title(card: &ElementRef<'_>) -> Option<String> {
    let selector = title_candidates()?;
    card.select(selector)
        .map(|el| element_text(&el))
        .find(|text| text.chars().count() > MIN_TITLE_CHARS && !has_currency_mark(text))
}

/// First currency-prefixed numeric token anywhere in the card text.
#[must_use]
pub fn fallback_price(card: &ElementRef<'_>) -> Option<String> {
    let pattern = price_token()?;
    let text = element_text(card);
    pattern
        .find(&text)
        .map(|m| m.as_str().to_string())
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
}
