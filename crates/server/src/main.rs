//! chameleo-catalog server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use chameleo_client::{HttpCatalogSource, SourceConfig, SyncConfig, SyncOrchestrator};
use chameleo_core::{AppConfig, CacheDb, CatalogCache};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        base_url = %config.base_url,
        db_path = %config.db_path.display(),
        namespace = %config.namespace,
        "Starting chameleo-catalog server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let cache = Arc::new(CatalogCache::new(db, &config.namespace));
    let source = HttpCatalogSource::new(SourceConfig::from(&config))?;
    let orchestrator = Arc::new(SyncOrchestrator::new(source, cache, SyncConfig::from(&config)).await);
    let shutdown = CancellationToken::new();

    if config.sync_on_start {
        let orchestrator = Arc::clone(&orchestrator);
        let cancel = shutdown.child_token();
        tokio::spawn(async move {
            match orchestrator.sync_if_stale(&cancel).await {
                Ok(Some(outcome)) => tracing::info!(products = outcome.products.len(), "startup sync completed"),
                Ok(None) => tracing::debug!("cache is fresh; startup sync skipped"),
                Err(e) => tracing::warn!(error = %e, "startup sync failed; serving cached catalog"),
            }
        });
    }

    let handler = handler::CatalogServer::new(orchestrator, shutdown.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    shutdown.cancel();

    Ok(())
}
