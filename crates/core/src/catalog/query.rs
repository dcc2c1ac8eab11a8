//! Read-only views over the cached catalog.
//!
//! Nothing here triggers a sync; every call reads whatever snapshot the cache
//! currently holds.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::model::{Collection, Product};
use crate::Error;
use crate::cache::{CacheStore, CatalogCache};

/// Availability filter input as consumers send it: a boolean or a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AvailabilityInput {
    Flag(bool),
    /// `"true"`, `"false"` or `"all"`.
    Keyword(String),
}

/// Resolved availability filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AvailabilityFilter {
    #[default]
    All,
    Only(bool),
}

impl TryFrom<AvailabilityInput> for AvailabilityFilter {
    type Error = Error;

    fn try_from(input: AvailabilityInput) -> Result<Self, Self::Error> {
        match input {
            AvailabilityInput::Flag(flag) => Ok(AvailabilityFilter::Only(flag)),
            AvailabilityInput::Keyword(word) => match word.trim().to_ascii_lowercase().as_str() {
                "all" | "" => Ok(AvailabilityFilter::All),
                "true" => Ok(AvailabilityFilter::Only(true)),
                "false" => Ok(AvailabilityFilter::Only(false)),
                other => Err(Error::InvalidInput(format!(
                    "available must be true, false or \"all\", got {other:?}"
                ))),
            },
        }
    }
}

impl AvailabilityFilter {
    fn matches(self, product: &Product) -> bool {
        match self {
            AvailabilityFilter::All => true,
            AvailabilityFilter::Only(flag) => product.available == flag,
        }
    }
}

/// Filters applied by [`CatalogQuery::products`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    /// Case-insensitive substring matched against name or description.
    pub search: Option<String>,
    /// Exact match against `product_type`.
    pub category: Option<String>,
    pub available: AvailabilityFilter,
}

impl ProductFilters {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn available(mut self, available: bool) -> Self {
        self.available = AvailabilityFilter::Only(available);
        self
    }

    /// Apply search, then category, then availability. Order is preserved.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let search = non_blank(self.search.as_deref()).map(str::to_lowercase);
        let category = non_blank(self.category.as_deref());

        products
            .into_iter()
            .filter(|p| {
                search.as_deref().is_none_or(|term| {
                    p.name.to_lowercase().contains(term) || p.description.to_lowercase().contains(term)
                })
            })
            .filter(|p| category.is_none_or(|c| p.product_type == c))
            .filter(|p| self.available.matches(p))
            .collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Filtered product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
}

/// Whether a snapshot has ever been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LastSyncStatus {
    Completed,
    Never,
}

/// Aggregate counts over the cached catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_products: usize,
    pub available_products: usize,
    pub total_collections: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_sync_status: LastSyncStatus,
}

/// Query layer over a shared [`CatalogCache`].
#[derive(Debug)]
pub struct CatalogQuery<S> {
    cache: Arc<CatalogCache<S>>,
}

impl<S> Clone for CatalogQuery<S> {
    fn clone(&self) -> Self {
        Self { cache: Arc::clone(&self.cache) }
    }
}

impl<S: CacheStore> CatalogQuery<S> {
    pub fn new(cache: Arc<CatalogCache<S>>) -> Self {
        Self { cache }
    }

    /// Cached products matching `filters`, with their count.
    pub async fn products(&self, filters: &ProductFilters) -> ProductPage {
        let products = filters.apply(self.cache.read_products().await);
        ProductPage { total: products.len(), products }
    }

    pub async fn collections(&self) -> Vec<Collection> {
        self.cache.read_collections().await
    }

    pub async fn stats(&self) -> CatalogStats {
        let snapshot = self.cache.read_snapshot().await;
        CatalogStats {
            total_products: snapshot.products.len(),
            available_products: snapshot.products.iter().filter(|p| p.available).count(),
            total_collections: snapshot.collections.len(),
            last_sync: snapshot.last_sync,
            last_sync_status: if snapshot.last_sync.is_some() {
                LastSyncStatus::Completed
            } else {
                LastSyncStatus::Never
            },
        }
    }

    /// Look a product up by id or handle.
    pub async fn product(&self, id_or_handle: &str) -> Option<Product> {
        self.cache
            .read_products()
            .await
            .into_iter()
            .find(|p| p.id == id_or_handle || p.handle == id_or_handle)
    }

    /// Cached products belonging to a collection.
    ///
    /// Membership is inferred from tags or product type matching the
    /// collection's handle or title, case-insensitively.
    pub async fn collection_products(&self, handle: &str) -> Result<ProductPage, Error> {
        let collection = self
            .collections()
            .await
            .into_iter()
            .find(|c| c.handle == handle)
            .ok_or_else(|| Error::NotFound(format!("collection {handle}")))?;

        let keys = [collection.handle.to_lowercase(), collection.title.to_lowercase()];
        let products: Vec<Product> = self
            .cache
            .read_products()
            .await
            .into_iter()
            .filter(|p| {
                keys.iter().any(|k| {
                    p.product_type.to_lowercase() == *k || p.tags.iter().any(|t| t.to_lowercase() == *k)
                })
            })
            .collect();

        Ok(ProductPage { total: products.len(), products })
    }

    /// Distinct non-empty product types, sorted.
    pub async fn categories(&self) -> Vec<String> {
        self.cache
            .read_products()
            .await
            .into_iter()
            .map(|p| p.product_type)
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
