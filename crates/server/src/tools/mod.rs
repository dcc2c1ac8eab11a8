//! MCP tool implementations.
//!
//! This module contains all tools exposed by the catalog server. Each tool is
//! a free function over the query layer or the sync orchestrator so it can be
//! exercised without a transport.

pub mod collections;
pub mod products;
pub mod stats;
pub mod sync;

pub use collections::collections_impl;
pub use products::{CatalogProductParams, CatalogProductsParams, product_impl, products_impl};
pub use stats::stats_impl;
pub use sync::{CatalogSyncParams, sync_impl};

use chameleo_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("failed to serialize tool output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
