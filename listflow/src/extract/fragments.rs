//! Listing-card discovery and stable fragment keys.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use super::strategy::{element_text, has_currency_mark};

/// Card selectors, most specific first. The first one that matches anything wins.
pub const CARD_SELECTORS: &[&str] = &[
    "[data-testid=\"item-cell\"]",
    "mer-item-thumbnail",
    ".merItemThumbnail",
    ".items-box",
    ".item-cell",
    ".merItemList > div",
];

const MIN_GENERIC_CARD_TEXT: usize = 10;

fn compiled_card_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        CARD_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect()
    })
}

fn selector(source: &'static str) -> Option<Selector> {
    Selector::parse(source).ok()
}

fn item_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/item/([a-zA-Z0-9]+)").ok())
        .as_ref()
}

/// Extracts an item id from a link or locator.
#[must_use]
pub fn parse_item_id(href: &str) -> Option<String> {
    item_id_pattern()?
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Enumerates listing cards in document order.
///
/// Falls back to a structural heuristic when no card selector matches: the
/// innermost `div`s holding an image, a currency mark and some text.
#[must_use]
pub fn discover_cards(document: &Html) -> Vec<ElementRef<'_>> {
    for (source, selector) in CARD_SELECTORS.iter().zip(compiled_card_selectors()) {
        let cards: Vec<_> = document.select(selector).collect();
        if !cards.is_empty() {
            debug!(selector = source, count = cards.len(), "Discovered listing cards");
            return cards;
        }
    }

    let cards = generic_cards(document);
    debug!(count = cards.len(), "Discovered listing cards by structure");
    cards
}

fn generic_cards(document: &Html) -> Vec<ElementRef<'_>> {
    let (Some(divs), Some(images)) = (selector("div"), selector("img")) else {
        return Vec::new();
    };

    let looks_like_card = |el: &ElementRef<'_>| {
        if el.select(&images).next().is_none() {
            return false;
        }
        let text = element_text(el);
        has_currency_mark(&text) && text.chars().count() > MIN_GENERIC_CARD_TEXT
    };

    document
        .select(&divs)
        .filter(|el| looks_like_card(el))
        .filter(|el| !el.select(&divs).any(|inner| looks_like_card(&inner)))
        .collect()
}

/// Element-sibling index of every element from the root down to `el`.
fn element_path(el: &ElementRef<'_>) -> Vec<usize> {
    let mut path: Vec<usize> = std::iter::once(**el)
        .chain(el.ancestors())
        .filter(|node| node.value().is_element())
        .map(|node| {
            node.prev_siblings()
                .filter(|sibling| sibling.value().is_element())
                .count()
        })
        .collect();
    path.reverse();
    path
}

/// Stable identity for a fragment across document snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentKey(String);

impl FragmentKey {
    /// Derives the key from the card's item link, or from its position in the
    /// document when no item id is present.
    ///
    /// The positional key is the chain of element-sibling indices from the
    /// document root down to the card. It survives changes to the card's own
    /// markup and tells apart cards whose markup is identical.
    #[must_use]
    pub fn for_card(card: &ElementRef<'_>) -> Self {
        let item_id = selector("a[href]").and_then(|links| {
            card.select(&links)
                .filter_map(|a| a.value().attr("href"))
                .find_map(parse_item_id)
        });

        match item_id {
            Some(id) => Self::for_item(&id),
            None => Self::for_path(&element_path(card)),
        }
    }

    /// Key for a card linking to item `id`.
    #[must_use]
    pub fn for_item(id: &str) -> Self {
        Self(format!("item:{id}"))
    }

    /// Key for the element at `path`, root first.
    #[must_use]
    pub fn for_path(path: &[usize]) -> Self {
        let chain: Vec<String> = path.iter().map(usize::to_string).collect();
        Self(format!("node:{}", chain.join(".")))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
