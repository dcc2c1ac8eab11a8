//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use chameleo_client::{HttpCatalogSource, SyncOrchestrator};
use chameleo_core::CacheDb;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tokio_util::sync::CancellationToken;

use crate::tools::{
    CatalogProductParams, CatalogProductsParams, CatalogSyncParams, collections_impl, product_impl, products_impl,
    stats_impl, sync_impl,
};

/// The orchestrator the server runs against: the storefront feed into SQLite.
pub type CatalogOrchestrator = SyncOrchestrator<HttpCatalogSource, CacheDb>;

/// The main MCP server handler for the catalog service.
#[derive(Clone)]
pub struct CatalogServer {
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<CatalogOrchestrator>,
    /// Cancelled when the server shuts down; in-flight syncs stop without committing.
    shutdown: CancellationToken,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl CatalogServer {
    /// Create a new server handler.
    pub fn new(orchestrator: Arc<CatalogOrchestrator>, shutdown: CancellationToken) -> Self {
        Self { tool_router: Self::tool_router(), orchestrator, shutdown }
    }

    #[tool(
        description = "List cached products. Optional filters: search (name/description text), category (exact product type), available (true, false or \"all\"), collection (handle). Returns products and total."
    )]
    async fn catalog_products(&self, params: Parameters<CatalogProductsParams>) -> Result<CallToolResult, McpError> {
        products_impl(&self.orchestrator.query(), params.0).await
    }

    #[tool(description = "Get one cached product by id or handle.")]
    async fn catalog_product(&self, params: Parameters<CatalogProductParams>) -> Result<CallToolResult, McpError> {
        product_impl(&self.orchestrator.query(), params.0).await
    }

    #[tool(description = "List cached collections with their total.")]
    async fn catalog_collections(&self) -> Result<CallToolResult, McpError> {
        collections_impl(&self.orchestrator.query()).await
    }

    /// Counts, categories, sync state and staleness. Never triggers a sync.
    #[tool(description = "Catalog statistics: product and collection counts, categories, last sync, sync state and staleness.")]
    async fn catalog_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.orchestrator).await
    }

    #[tool(
        description = "Refresh the catalog cache from the storefront. Skipped when the cache is fresh unless force is true. Concurrent calls share one sync."
    )]
    async fn catalog_sync(
        &self, params: Parameters<CatalogSyncParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        sync_impl(&self.orchestrator, params.0, &self.shutdown, &context.ct).await
    }
}

impl ServerHandler for CatalogServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "chameleo-catalog".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Read-only access to the cached Chameleo storefront catalog. Use catalog_sync to refresh it.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleo_client::{SourceConfig, SyncConfig};
    use chameleo_core::CatalogCache;

    async fn server() -> CatalogServer {
        let cache = Arc::new(CatalogCache::new(CacheDb::open_in_memory().await.unwrap(), "chameleo"));
        let source =
            HttpCatalogSource::new(SourceConfig { base_url: "http://127.0.0.1:9".into(), ..Default::default() })
                .unwrap();
        let orchestrator = SyncOrchestrator::new(source, cache, SyncConfig::default()).await;
        CatalogServer::new(Arc::new(orchestrator), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_registers_catalog_tools() {
        let server = server().await;
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            ["catalog_collections", "catalog_product", "catalog_products", "catalog_stats", "catalog_sync"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let info = server().await.get_info();
        assert_eq!(info.server_info.name, "chameleo-catalog");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_tools_read_empty_cache() {
        let server = server().await;
        assert!(server.catalog_stats().await.is_ok());
        assert!(server.catalog_collections().await.is_ok());

        let missing = server
            .catalog_product(Parameters(CatalogProductParams { id_or_handle: "shield".into() }))
            .await;
        assert!(missing.is_err());
    }
}
