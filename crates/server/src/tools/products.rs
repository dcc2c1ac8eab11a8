//! catalog_products and catalog_product tool implementations.

use chameleo_core::catalog::{AvailabilityFilter, AvailabilityInput};
use chameleo_core::{CacheStore, CatalogQuery, Error, ProductFilters, ProductPage};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the catalog_products tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CatalogProductsParams {
    /// Case-insensitive text matched against product name or description.
    #[serde(default)]
    pub search: Option<String>,

    /// Exact product type, e.g. "sport".
    #[serde(default)]
    pub category: Option<String>,

    /// `true`, `false`, or `"all"` (default).
    #[serde(default)]
    pub available: Option<AvailabilityInput>,

    /// Restrict to products in the collection with this handle.
    #[serde(default)]
    pub collection: Option<String>,
}

impl CatalogProductsParams {
    fn filters(&self) -> Result<ProductFilters, Error> {
        let available = match self.available.clone() {
            Some(input) => AvailabilityFilter::try_from(input)?,
            None => AvailabilityFilter::All,
        };
        Ok(ProductFilters { search: self.search.clone(), category: self.category.clone(), available })
    }
}

/// Parameters for the catalog_product tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogProductParams {
    /// Product id or handle.
    pub id_or_handle: String,
}

/// Implementation of the catalog_products tool.
pub async fn products_impl<S: CacheStore>(
    query: &CatalogQuery<S>, params: CatalogProductsParams,
) -> Result<CallToolResult, McpError> {
    let filters = params.filters()?;

    let page = match params.collection.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        Some(handle) => {
            let members = query.collection_products(handle).await?;
            let products = filters.apply(members.products);
            ProductPage { total: products.len(), products }
        }
        None => query.products(&filters).await,
    };

    tracing::debug!(total = page.total, "catalog_products");
    json_result(&page)
}

/// Implementation of the catalog_product tool.
pub async fn product_impl<S: CacheStore>(
    query: &CatalogQuery<S>, params: CatalogProductParams,
) -> Result<CallToolResult, McpError> {
    let key = params.id_or_handle.trim();
    if key.is_empty() {
        return Err(Error::InvalidInput("id_or_handle must not be empty".into()).into());
    }

    let product = query
        .product(key)
        .await
        .ok_or_else(|| Error::NotFound(format!("product {key}")))?;

    json_result(&product)
}
