//! catalog_sync tool implementation.
//!
//! Refreshes the cache from the storefront. Unless forced, a fresh cache is
//! left alone and the current stats are returned.

use chameleo_client::{CatalogSource, SyncOrchestrator};
use chameleo_core::{CacheStore, CatalogStats};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::json_result;

/// Parameters for the catalog_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSyncParams {
    /// Sync even when the cache is still fresh (default: false).
    #[serde(default)]
    pub force: bool,
}

/// Output from the catalog_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSyncOutput {
    /// Whether a sync ran (or was joined) for this call.
    pub synced: bool,
    /// Products written by the sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
    /// Collections written by the sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    pub stats: CatalogStats,
}

/// Implementation of the catalog_sync tool.
///
/// The sync stops without committing when either `shutdown` or the
/// client's `request` token fires. A cancelled request still waits for the
/// sync to settle, so a snapshot already being written is never abandoned
/// half way.
pub async fn sync_impl<C: CatalogSource, S: CacheStore>(
    orchestrator: &SyncOrchestrator<C, S>, params: CatalogSyncParams, shutdown: &CancellationToken,
    request: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    let cancel = shutdown.child_token();
    let run = async {
        if params.force {
            orchestrator.sync_catalog_with(&cancel).await.map(Some)
        } else {
            orchestrator.sync_if_stale(&cancel).await
        }
    };
    tokio::pin!(run);

    let outcome = tokio::select! {
        biased;
        _ = request.cancelled() => {
            tracing::debug!("catalog_sync request cancelled by client");
            cancel.cancel();
            run.await
        }
        result = &mut run => result,
    }?;

    if outcome.is_none() {
        tracing::debug!("catalog_sync skipped; cache is fresh");
    }

    let output = CatalogSyncOutput {
        synced: outcome.is_some(),
        products: outcome.as_ref().map(|o| o.products.len()),
        collections: outcome.as_ref().map(|o| o.collections.len()),
        elapsed_ms: outcome.as_ref().map(|o| o.elapsed.as_millis() as u64),
        stats: orchestrator.query().stats().await,
    };
    json_result(&output)
}
