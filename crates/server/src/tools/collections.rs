//! catalog_collections tool implementation.

use chameleo_core::{CacheStore, CatalogQuery, Collection};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the catalog_collections tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogCollectionsOutput {
    pub collections: Vec<Collection>,
    pub total: usize,
}

/// Implementation of the catalog_collections tool.
pub async fn collections_impl<S: CacheStore>(query: &CatalogQuery<S>) -> Result<CallToolResult, McpError> {
    let collections = query.collections().await;
    json_result(&CatalogCollectionsOutput { total: collections.len(), collections })
}
