//! JSON payload sent to the inventory endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::ListingRecord;

/// Seller block of an outbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerInfo {
    /// Display name.
    pub name: String,
    /// Seller id, empty when unknown.
    pub id: String,
}

/// Body of `POST {base}{path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
    /// Listing title.
    pub title: String,
    /// Numeric price, `null` when unparsable.
    pub price: Option<f64>,
    /// Listing URL.
    pub source_url: String,
    /// Platform tag.
    pub platform: String,
    /// RFC 3339 UTC timestamp with milliseconds.
    pub timestamp: String,
    /// Item id on the source marketplace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Item description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Seller information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerInfo>,
    /// Item condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl OutboundPayload {
    /// Formats a record, stamping the current time.
    ///
    /// `fallback_url` is used when the record carries no URL of its own.
    #[must_use]
    pub fn from_record(record: &ListingRecord, platform: &str, fallback_url: &str) -> Self {
        Self::from_record_at(record, platform, fallback_url, Utc::now())
    }

    /// Formats a record with an explicit timestamp.
    #[must_use]
    pub fn from_record_at(
        record: &ListingRecord,
        platform: &str,
        fallback_url: &str,
        at: DateTime<Utc>,
    ) -> Self {
        let source_url = if record.url.is_empty() {
            fallback_url.to_string()
        } else {
            record.url.clone()
        };

        Self {
            title: record.title.clone(),
            price: record.price_value,
            source_url,
            platform: platform.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            source_id: record.id.clone().filter(|id| !id.is_empty()),
            description: record.description.clone().filter(|d| !d.is_empty()),
            images: (!record.image_urls.is_empty()).then(|| record.image_urls.clone()),
            seller: record
                .seller_name
                .as_ref()
                .filter(|name| !name.is_empty())
                .map(|name| SellerInfo {
                    name: name.clone(),
                    id: record.seller_id.clone().unwrap_or_default(),
                }),
            condition: record.condition.clone().filter(|c| !c.is_empty()),
        }
    }
}
