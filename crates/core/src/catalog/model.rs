//! Canonical catalog records.
//!
//! These are the strict, source-agnostic shapes produced by the normalizer and
//! persisted in the cache. Field names serialize in camelCase so cached JSON
//! matches what storefront consumers already read.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized storefront product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable external identifier, primary key within the cache.
    pub id: String,
    pub name: String,
    /// Product body as delivered by the source (HTML kept as-is).
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    /// URL slug.
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lowest positive variant price, 0 when no variant carries one.
    pub price_min: f64,
    /// Highest positive variant price, 0 when no variant carries one.
    pub price_max: f64,
    /// Compare-at price of the first variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,
    pub available: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Wall-clock time of normalization.
    pub scraped_at: DateTime<Utc>,
}

impl Product {
    /// Returns `true` when at least one variant carried a positive price.
    ///
    /// Products without one are reported with `price_min == price_max == 0`.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.price_max > 0.0
    }

    /// Returns `true` when the compare-at price is above the lowest price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .is_some_and(|compare| self.has_price() && compare > self.price_min)
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}

/// A purchasable variant of a [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    /// Price as the numeric string the source reported, e.g. `"129.00"`.
    pub price: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// A normalized storefront collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub products_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// The unit of cached catalog state.
///
/// `last_sync` is `None` only when the catalog has never been synced, in which
/// case both lists are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub collections: Vec<Collection>,
    pub last_sync: Option<DateTime<Utc>>,
}
