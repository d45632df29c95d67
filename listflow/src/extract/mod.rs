//! Resilient field extraction.
//!
//! [`FieldExtractor`] turns a listing card or a whole item page into a
//! [`ListingRecord`]. Every field is read through an ordered
//! [`FieldStrategies`] table; card title and price additionally fall back to
//! structural heuristics. Extraction never fails as a whole: a field that
//! cannot be read is left empty and the rest of the record is still built.

mod fallback;
mod fragments;
mod strategy;

pub use fallback::{fallback_price, fallback_title};
pub use fragments::{discover_cards, parse_item_id, FragmentKey, CARD_SELECTORS};
pub use strategy::{
    element_text, has_currency_mark, Accessor, FieldStrategies, Strategy, CURRENCY_MARKS,
};

use regex::Regex;
use scraper::{ElementRef, Html};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};
use url::Url;

use crate::listing::{parse_price, ListingRecord};

/// Resolves `href` against `base`, keeping the raw value when that fails.
#[must_use]
pub fn resolve_url(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map_or_else(|_| href.to_string(), |u| u.to_string()),
        None => Url::parse(href).map_or_else(|_| href.to_string(), |u| u.to_string()),
    }
}

/// Runs one field read, turning a panic into an absent value.
fn guarded<T>(field: &'static str, read: impl FnOnce() -> Option<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(read)) {
        Ok(value) => {
            if value.is_none() {
                debug!(field, "No strategy produced a value");
            }
            value
        }
        Err(_) => {
            warn!(field, "Field extraction panicked");
            None
        }
    }
}

/// Strategy tables for listing cards.
#[derive(Debug, Clone)]
struct CardTables {
    title: FieldStrategies,
    price: FieldStrategies,
    link: FieldStrategies,
    image: FieldStrategies,
}

/// Strategy tables for single item pages.
#[derive(Debug, Clone)]
struct PageTables {
    title: FieldStrategies,
    price: FieldStrategies,
    description: FieldStrategies,
    condition: FieldStrategies,
    seller_name: FieldStrategies,
    seller_id: FieldStrategies,
    images: FieldStrategies,
}

/// Builds listing records from markup.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    card: CardTables,
    page: PageTables,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Compiles the built-in strategy tables.
    #[must_use]
    pub fn new() -> Self {
        let card = CardTables {
            title: FieldStrategies::uniform(
                "title",
                &[
                    "[data-testid=\"thumbnail-item-name\"]",
                    ".merItemThumbnail h3",
                    ".merItemList h3",
                    ".items-box h3",
                    ".item-name",
                ],
                &Accessor::Text,
            ),
            price: FieldStrategies::uniform(
                "price",
                &[
                    "[data-testid=\"thumbnail-item-price\"]",
                    ".merItemThumbnail span",
                    ".item-price",
                    ".price",
                ],
                &Accessor::CurrencyText,
            ),
            link: FieldStrategies::uniform("url", &["a[href]"], &Accessor::Attr("href")),
            image: FieldStrategies::uniform("image", &["img[src]"], &Accessor::Attr("src")),
        };

        let seller_link = Regex::new(r"/user/([a-zA-Z0-9]+)").ok();
        let seller_id_specs = seller_link
            .map(|pattern| {
                [
                    "a[data-location=\"item_details:seller_info\"]",
                    "a[href*=\"/user/\"]",
                ]
                .into_iter()
                .map(|source| {
                    (
                        source,
                        Accessor::AttrCapture {
                            attr: "href",
                            pattern: pattern.clone(),
                        },
                    )
                })
                .collect()
            })
            .unwrap_or_default();

        let page = PageTables {
            title: FieldStrategies::uniform(
                "title",
                &[".merHeading h1", "#item-info h1", "h1.item-name"],
                &Accessor::Text,
            ),
            price: FieldStrategies::uniform(
                "price",
                &["[data-testid=\"price\"]", ".item-price", ".price"],
                &Accessor::Text,
            ),
            description: FieldStrategies::uniform(
                "description",
                &[
                    "[data-testid=\"description\"]",
                    ".item-description",
                    ".description",
                ],
                &Accessor::Text,
            ),
            condition: FieldStrategies::uniform(
                "condition",
                &[
                    "#item-info span[data-testid=\"商品の状態\"]",
                    ".item-condition",
                ],
                &Accessor::Text,
            ),
            seller_name: FieldStrategies::uniform(
                "seller_name",
                &[".merUserObject p", ".seller-name"],
                &Accessor::Text,
            ),
            seller_id: FieldStrategies::compile("seller_id", seller_id_specs),
            images: FieldStrategies::uniform(
                "images",
                &[".slick-list .slick-slide img", ".item-photos img"],
                &Accessor::Attr("src"),
            ),
        };

        Self { card, page }
    }

    /// Extracts a record from one listing card.
    ///
    /// Links and image sources are resolved against `base` when given.
    #[must_use]
    pub fn extract_card(&self, card: &ElementRef<'_>, base: Option<&Url>) -> ListingRecord {
        let tables = &self.card;

        let title = guarded("title", || {
            tables
                .title
                .first_match(card)
                .or_else(|| fallback_title(card))
        })
        .unwrap_or_default();

        let price_raw = guarded("price", || {
            tables
                .price
                .first_match(card)
                .or_else(|| fallback_price(card))
        })
        .unwrap_or_default();

        let url = guarded("url", || tables.link.first_match(card))
            .map(|href| resolve_url(base, &href))
            .unwrap_or_default();

        let image_urls = guarded("image", || tables.image.first_match(card))
            .map(|src| vec![resolve_url(base, &src)])
            .unwrap_or_default();

        ListingRecord {
            id: parse_item_id(&url),
            price_value: parse_price(&price_raw),
            title,
            price_raw,
            url,
            image_urls,
            ..ListingRecord::default()
        }
    }

    /// Extracts a record from a single item page.
    #[must_use]
    pub fn extract_listing_page(&self, document: &Html, locator: &str) -> ListingRecord {
        let tables = &self.page;
        let root = document.root_element();
        let base = Url::parse(locator).ok();

        let price_raw = guarded("price", || tables.price.first_match(&root)).unwrap_or_default();
        let image_urls = guarded("images", || {
            let images = tables.images.first_list(&root);
            (!images.is_empty()).then_some(images)
        })
        .map(|images| {
            images
                .iter()
                .map(|src| resolve_url(base.as_ref(), src))
                .collect()
        })
        .unwrap_or_default();

        ListingRecord {
            id: parse_item_id(locator),
            title: guarded("title", || tables.title.first_match(&root)).unwrap_or_default(),
            price_value: parse_price(&price_raw),
            price_raw,
            url: locator.to_string(),
            image_urls,
            seller_name: guarded("seller_name", || tables.seller_name.first_match(&root)),
            seller_id: guarded("seller_id", || tables.seller_id.first_match(&root)),
            condition: guarded("condition", || tables.condition.first_match(&root)),
            description: guarded("description", || tables.description.first_match(&root)),
        }
    }
}
