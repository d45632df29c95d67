//! Declarative extraction strategies.
//!
//! A [`FieldStrategies`] table is an ordered list of (selector, accessor)
//! pairs for one field. Evaluation walks the table in priority order and
//! stops at the first strategy whose accessor yields a non-empty string.

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

/// Currency marks recognised in price text.
pub const CURRENCY_MARKS: [char; 2] = ['¥', '￥'];

/// Returns true if the text contains a currency mark.
#[must_use]
pub fn has_currency_mark(text: &str) -> bool {
    text.contains(CURRENCY_MARKS)
}

/// How a value is read from a matched element.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Trimmed text content.
    Text,
    /// Trimmed text content, only if it contains a currency mark.
    CurrencyText,
    /// Trimmed attribute value.
    Attr(&'static str),
    /// First capture group of a pattern applied to an attribute value.
    AttrCapture {
        /// Attribute to read.
        attr: &'static str,
        /// Pattern with one capture group.
        pattern: Regex,
    },
}

impl Accessor {
    /// Reads the value from an element. Empty results are `None`.
    #[must_use]
    pub fn read(&self, element: &ElementRef<'_>) -> Option<String> {
        let value = match self {
            Self::Text => element_text(element),
            Self::CurrencyText => {
                let text = element_text(element);
                if has_currency_mark(&text) {
                    text
                } else {
                    String::new()
                }
            }
            Self::Attr(name) => element.value().attr(name).unwrap_or_default().trim().to_string(),
            Self::AttrCapture { attr, pattern } => element
                .value()
                .attr(attr)
                .and_then(|v| pattern.captures(v))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// A single (selector, accessor) pair.
#[derive(Debug, Clone)]
pub struct Strategy {
    source: &'static str,
    selector: Selector,
    accessor: Accessor,
}

impl Strategy {
    /// The selector text this strategy was compiled from.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        self.source
    }

    /// Reads from the first element under `scope` matching the selector.
    #[must_use]
    pub fn apply(&self, scope: &ElementRef<'_>) -> Option<String> {
        scope
            .select(&self.selector)
            .next()
            .and_then(|element| self.accessor.read(&element))
    }

    /// Reads from every element under `scope` matching the selector.
    #[must_use]
    pub fn apply_all(&self, scope: &ElementRef<'_>) -> Vec<String> {
        scope
            .select(&self.selector)
            .filter_map(|element| self.accessor.read(&element))
            .collect()
    }

    /// Whether any element under `scope` matches the selector.
    #[must_use]
    pub fn matches_any(&self, scope: &ElementRef<'_>) -> bool {
        scope.select(&self.selector).next().is_some()
    }
}

/// Ordered strategy table for one field.
#[derive(Debug, Clone)]
pub struct FieldStrategies {
    field: &'static str,
    strategies: Vec<Strategy>,
}

impl FieldStrategies {
    /// Compiles a table. Selectors that fail to parse are logged and skipped.
    #[must_use]
    pub fn compile(field: &'static str, specs: Vec<(&'static str, Accessor)>) -> Self {
        let strategies = specs
            .into_iter()
            .filter_map(|(source, accessor)| match Selector::parse(source) {
                Ok(selector) => Some(Strategy {
                    source,
                    selector,
                    accessor,
                }),
                Err(e) => {
                    warn!(field, selector = source, error = %e, "Skipping invalid selector");
                    None
                }
            })
            .collect();
        Self { field, strategies }
    }

    /// Compiles a table where every selector uses the same accessor.
    #[must_use]
    pub fn uniform(field: &'static str, selectors: &[&'static str], accessor: &Accessor) -> Self {
        Self::compile(
            field,
            selectors.iter().map(|s| (*s, accessor.clone())).collect(),
        )
    }

    /// The field this table extracts.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// The compiled strategies in priority order.
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Returns the first non-empty value in priority order.
    #[must_use]
    pub fn first_match(&self, scope: &ElementRef<'_>) -> Option<String> {
        self.strategies.iter().find_map(|s| s.apply(scope))
    }

    /// Returns all values from the first strategy whose selector matches
    /// anything under `scope`.
    #[must_use]
    pub fn first_list(&self, scope: &ElementRef<'_>) -> Vec<String> {
        self.strategies
            .iter()
            .find(|s| s.matches_any(scope))
            .map(|s| s.apply_all(scope))
            .unwrap_or_default()
    }
}

/// Trimmed, whitespace-collapsed text content of an element.
#[must_use]
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
