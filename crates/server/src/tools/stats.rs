//! catalog_stats tool implementation.

use chameleo_client::{CatalogSource, SyncOrchestrator};
use chameleo_core::{CacheStore, CatalogStats, SyncStatus};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the catalog_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatsOutput {
    #[serde(flatten)]
    pub stats: CatalogStats,
    /// Distinct product types in the cache.
    pub categories: Vec<String>,
    /// Current sync lifecycle state and last failure.
    pub sync: SyncStatus,
    /// Whether the cache is missing or past the staleness threshold.
    pub stale: bool,
}

/// Implementation of the catalog_stats tool.
pub async fn stats_impl<C: CatalogSource, S: CacheStore>(
    orchestrator: &SyncOrchestrator<C, S>,
) -> Result<CallToolResult, McpError> {
    let query = orchestrator.query();
    let output = CatalogStatsOutput {
        stats: query.stats().await,
        categories: query.categories().await,
        sync: orchestrator.status().await,
        stale: orchestrator.is_stale().await,
    };
    json_result(&output)
}
