//! Catalog sync orchestration.
//!
//! A sync pulls every product page and the collection list from a
//! [`CatalogSource`], normalizes them, and commits one snapshot to the
//! [`CatalogCache`]. A sync that fails or is cancelled never touches the
//! cache, so the last good snapshot stays readable.
//!
//! Concurrent callers are collapsed: whoever waits on an in-flight sync gets
//! its outcome instead of starting another one.

mod staleness;

pub use staleness::is_stale_at;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chameleo_core::cache::{CacheStore, CatalogCache};
use chameleo_core::catalog::{CatalogQuery, SyncFailure, SyncState, SyncStatus};
use chameleo_core::{AppConfig, Collection, Error, Product};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::normalize::{normalize_collections, normalize_products};
use crate::source::CatalogSource;

/// Pagination and staleness settings for a [`SyncOrchestrator`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Records requested per product page (default: 250).
    pub page_size: u32,
    /// Pause between product page requests (default: 500ms).
    pub page_delay: Duration,
    /// Upper bound on product pages per sync (default: 100).
    pub max_pages: u32,
    /// Age after which the cache counts as stale (default: 24h).
    pub stale_after: chrono::Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SyncConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            page_delay: config.page_delay(),
            max_pages: config.max_pages,
            stale_after: config.stale_after(),
        }
    }
}

/// Result of a committed sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub products: Vec<Product>,
    pub collections: Vec<Collection>,
    pub synced_at: DateTime<Utc>,
    #[serde(skip)]
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct CompletedSync {
    generation: u64,
    outcome: Option<Arc<SyncOutcome>>,
}

/// Coordinates full catalog refreshes into the local cache.
pub struct SyncOrchestrator<C, S> {
    source: C,
    cache: Arc<CatalogCache<S>>,
    config: SyncConfig,
    /// Held for the duration of a sync; also records the last success.
    in_flight: Mutex<CompletedSync>,
    generation: AtomicU64,
    /// Never held across an await, so an abandoned attempt can restore it on drop.
    status: RwLock<SyncStatus>,
}

/// One sync attempt's claim on the status.
///
/// Dropping it unsettled (the sync future was dropped mid-flight) restores
/// the state that preceded the attempt.
struct Attempt<'a> {
    status: &'a RwLock<SyncStatus>,
    previous: SyncState,
    settled: bool,
}

impl<'a> Attempt<'a> {
    /// Move to `Syncing`, remembering the state to restore on failure.
    fn begin(status: &'a RwLock<SyncStatus>) -> Self {
        let previous = {
            let mut current = write_status(status);
            let previous = current.state;
            current.state = SyncState::Syncing { started_at: Utc::now() };
            previous
        };
        Self { status, previous, settled: false }
    }

    fn succeed(mut self, at: DateTime<Utc>) {
        self.settle(SyncState::Synced { at }, None);
    }

    fn fail(mut self, error: &Error) {
        let previous = self.previous;
        self.settle(previous, Some(error.to_string()));
    }

    fn settle(&mut self, state: SyncState, error: Option<String>) {
        let last_error = error.map(|message| SyncFailure { message, at: Utc::now() });
        *write_status(self.status) = SyncStatus { state, last_error };
        self.settled = true;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("catalog sync abandoned before completion; keeping previous snapshot");
            let previous = self.previous;
            self.settle(previous, Some(Error::SyncCancelled.to_string()));
        }
    }
}

fn write_status(status: &RwLock<SyncStatus>) -> RwLockWriteGuard<'_, SyncStatus> {
    status.write().unwrap_or_else(PoisonError::into_inner)
}

impl<C: CatalogSource, S: CacheStore> SyncOrchestrator<C, S> {
    /// Build an orchestrator whose state is seeded from the cache's last-sync stamp.
    pub async fn new(source: C, cache: Arc<CatalogCache<S>>, config: SyncConfig) -> Self {
        let state = SyncState::from_last_sync(cache.read_last_sync().await);
        Self {
            source,
            cache,
            config,
            in_flight: Mutex::new(CompletedSync::default()),
            generation: AtomicU64::new(0),
            status: RwLock::new(SyncStatus { state, last_error: None }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CatalogCache<S>> {
        &self.cache
    }

    /// Query layer over the same cache this orchestrator writes.
    pub fn query(&self) -> CatalogQuery<S> {
        CatalogQuery::new(Arc::clone(&self.cache))
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether the cached snapshot is missing or older than the threshold.
    pub async fn is_stale(&self) -> bool {
        is_stale_at(self.cache.read_last_sync().await, Utc::now(), self.config.stale_after)
    }

    /// Fetch every product page in order.
    ///
    /// Stops at the first page holding fewer than `page_size` records (an
    /// empty page included) or after `max_pages`. Sleeps `page_delay` between
    /// requests. Any page failure aborts the whole fetch.
    pub async fn fetch_all_products(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        let limit = self.config.page_size;
        let mut records = Vec::new();

        for page in 1..=self.config.max_pages {
            if page > 1 && !self.config.page_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::SyncCancelled),
                    _ = tokio::time::sleep(self.config.page_delay) => {}
                }
            }

            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::SyncCancelled),
                result = self.source.fetch_products_page(page, limit) => result?,
            };

            let received = batch.len();
            records.extend(batch);
            tracing::debug!(page, received, total = records.len(), "fetched product page");

            if received < limit as usize {
                return Ok(records);
            }
        }

        tracing::warn!(
            max_pages = self.config.max_pages,
            total = records.len(),
            "stopped product pagination at max_pages; catalog may be truncated"
        );
        Ok(records)
    }

    /// Fetch the collection list in one request.
    pub async fn fetch_all_collections(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::SyncCancelled),
            result = self.source.fetch_collections() => result,
        }
    }

    /// Run a full sync that cannot be cancelled.
    pub async fn sync_catalog(&self) -> Result<Arc<SyncOutcome>, Error> {
        self.sync_catalog_with(&CancellationToken::new()).await
    }

    /// Run a full sync, or join one already in flight.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error, [`Error::SyncCancelled`] if `cancel`
    /// fires before the snapshot is committed, or the cache write error. In
    /// every error case the cache is unchanged.
    pub async fn sync_catalog_with(&self, cancel: &CancellationToken) -> Result<Arc<SyncOutcome>, Error> {
        let seen = self.generation.load(Ordering::Acquire);
        let mut completed = self.in_flight.lock().await;

        if completed.generation != seen
            && let Some(outcome) = &completed.outcome
        {
            tracing::debug!("joined a sync that completed while waiting");
            return Ok(Arc::clone(outcome));
        }

        let attempt = Attempt::begin(&self.status);
        match self.run(cancel).await {
            Ok(outcome) => {
                let outcome = Arc::new(outcome);
                completed.generation += 1;
                completed.outcome = Some(Arc::clone(&outcome));
                self.generation.store(completed.generation, Ordering::Release);

                attempt.succeed(outcome.synced_at);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog sync failed; keeping previous snapshot");
                attempt.fail(&e);
                Err(e)
            }
        }
    }

    /// Sync only if the cache is stale. Returns `None` when it was fresh.
    pub async fn sync_if_stale(&self, cancel: &CancellationToken) -> Result<Option<Arc<SyncOutcome>>, Error> {
        if !self.is_stale().await {
            return Ok(None);
        }
        self.sync_catalog_with(cancel).await.map(Some)
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<SyncOutcome, Error> {
        let start = Instant::now();
        tracing::info!(page_size = self.config.page_size, "catalog sync started");

        let (product_records, collection_records) =
            tokio::try_join!(self.fetch_all_products(cancel), self.fetch_all_collections(cancel))?;

        let scraped_at = Utc::now();
        let products = normalize_products(&product_records, scraped_at);
        let collections = normalize_collections(&collection_records, scraped_at);

        if cancel.is_cancelled() {
            return Err(Error::SyncCancelled);
        }

        let synced_at = self.cache.write(&products, &collections).await?;

        tracing::info!(
            products = products.len(),
            collections = collections.len(),
            skipped = (product_records.len() - products.len()) + (collection_records.len() - collections.len()),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "catalog sync completed"
        );

        Ok(SyncOutcome { products, collections, synced_at, elapsed: start.elapsed() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chameleo_core::MemoryCacheStore;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    /// A feed that serves `pages[n - 1]` records for page `n` and nothing after.
    #[derive(Default)]
    struct ScriptedSource {
        pages: Vec<usize>,
        collections: usize,
        fail_on_page: Option<u32>,
        latency: Duration,
        product_calls: Arc<AtomicU32>,
        collection_calls: Arc<AtomicU32>,
    }

    impl ScriptedSource {
        fn pages(pages: &[usize]) -> Self {
            Self { pages: pages.to_vec(), collections: 2, ..Default::default() }
        }
    }

    #[async_trait::async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch_products_page(&self, page: u32, _limit: u32) -> Result<Vec<Value>, Error> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail_on_page == Some(page) {
                return Err(Error::HttpError { endpoint: "/products.json".into(), page: Some(page), status: 503 });
            }

            let count = self.pages.get(page as usize - 1).copied().unwrap_or(0);
            Ok((0..count)
                .map(|i| {
                    json!({
                        "id": format!("p{page}-{i}"),
                        "title": format!("Frame {page}-{i}"),
                        "product_type": "sport",
                        "variants": [{"price": "199.00", "available": true}]
                    })
                })
                .collect())
        }

        async fn fetch_collections(&self) -> Result<Vec<Value>, Error> {
            self.collection_calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.collections).map(|i| json!({"id": i + 1, "title": format!("Line {i}")})).collect())
        }
    }

    fn memory_cache() -> Arc<CatalogCache<MemoryCacheStore>> {
        Arc::new(CatalogCache::new(MemoryCacheStore::new(), "chameleo"))
    }

    fn config() -> SyncConfig {
        SyncConfig { page_delay: Duration::from_millis(500), ..Default::default() }
    }

    async fn orchestrator(
        source: ScriptedSource, cache: Arc<CatalogCache<MemoryCacheStore>>,
    ) -> SyncOrchestrator<ScriptedSource, MemoryCacheStore> {
        SyncOrchestrator::new(source, cache, config()).await
    }

    #[test]
    fn test_sync_config_from_app_config() {
        let config = SyncConfig::default();
        assert_eq!(config.page_size, 250);
        assert_eq!(config.page_delay, Duration::from_millis(500));
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.stale_after, chrono::Duration::hours(24));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_stops_at_short_page() {
        let source = ScriptedSource::pages(&[250, 250, 93]);
        let calls = Arc::clone(&source.product_calls);
        let orch = orchestrator(source, memory_cache()).await;

        let start = tokio::time::Instant::now();
        let records = orch.fetch_all_products(&CancellationToken::new()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(records.len(), 593);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_stops_at_empty_page() {
        let source = ScriptedSource::pages(&[250]);
        let calls = Arc::clone(&source.product_calls);
        let orch = orchestrator(source, memory_cache()).await;

        let records = orch.fetch_all_products(&CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(records.len(), 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_caps_at_max_pages() {
        let source = ScriptedSource::pages(&[250; 5]);
        let calls = Arc::clone(&source.product_calls);
        let orch =
            SyncOrchestrator::new(source, memory_cache(), SyncConfig { max_pages: 3, ..config() }).await;

        let records = orch.fetch_all_products(&CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(records.len(), 750);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_writes_snapshot() {
        let cache = memory_cache();
        let orch = orchestrator(ScriptedSource::pages(&[10]), Arc::clone(&cache)).await;
        assert_eq!(orch.status().await.state, SyncState::NeverSynced);

        let outcome = orch.sync_catalog().await.unwrap();
        assert_eq!(outcome.products.len(), 10);
        assert_eq!(outcome.collections.len(), 2);

        let snapshot = cache.read_snapshot().await;
        assert_eq!(snapshot.products.len(), 10);
        assert_eq!(snapshot.collections.len(), 2);
        assert_eq!(cache.read_last_sync().await, Some(outcome.synced_at));

        let status = orch.status().await;
        assert_eq!(status.state, SyncState::Synced { at: outcome.synced_at });
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_leaves_cache_untouched() {
        let cache = memory_cache();
        let seeded = orchestrator(ScriptedSource::pages(&[10]), Arc::clone(&cache)).await;
        let first = seeded.sync_catalog().await.unwrap();

        let failing = ScriptedSource { fail_on_page: Some(2), ..ScriptedSource::pages(&[250, 250, 40]) };
        let orch = orchestrator(failing, Arc::clone(&cache)).await;
        let err = orch.sync_catalog().await.unwrap_err();

        assert!(matches!(err, Error::HttpError { page: Some(2), .. }));
        assert_eq!(cache.read_products().await.len(), 10);
        assert_eq!(cache.read_last_sync().await, Some(first.synced_at));

        let status = orch.status().await;
        assert_eq!(status.state, SyncState::Synced { at: first.synced_at });
        assert!(status.last_error.unwrap().message.contains("page 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cache_write_is_reported() {
        let cache = memory_cache();
        cache.store().set_fail_writes(true);
        let orch = orchestrator(ScriptedSource::pages(&[3]), Arc::clone(&cache)).await;

        assert!(orch.sync_catalog().await.is_err());
        assert!(cache.read_products().await.is_empty());
        assert_eq!(orch.status().await.state, SyncState::NeverSynced);
        assert!(orch.status().await.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start() {
        let source = ScriptedSource::pages(&[10]);
        let calls = Arc::clone(&source.product_calls);
        let cache = memory_cache();
        let orch = orchestrator(source, Arc::clone(&cache)).await;

        let token = CancellationToken::new();
        token.cancel();

        assert!(matches!(orch.sync_catalog_with(&token).await, Err(Error::SyncCancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.read_last_sync().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_page_delay() {
        let source = ScriptedSource::pages(&[250; 10]);
        let calls = Arc::clone(&source.product_calls);
        let cache = memory_cache();
        let orch = orchestrator(source, Arc::clone(&cache)).await;
        let token = CancellationToken::new();

        let (result, ()) = tokio::join!(orch.sync_catalog_with(&token), async {
            tokio::time::sleep(Duration::from_millis(700)).await;
            token.cancel();
        });

        assert!(matches!(result, Err(Error::SyncCancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.read_products().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_syncs_share_one_run() {
        let source = ScriptedSource { latency: Duration::from_millis(50), ..ScriptedSource::pages(&[5]) };
        let product_calls = Arc::clone(&source.product_calls);
        let collection_calls = Arc::clone(&source.collection_calls);
        let orch = orchestrator(source, memory_cache()).await;

        let (first, second) = tokio::join!(orch.sync_catalog(), orch.sync_catalog());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(product_calls.load(Ordering::SeqCst), 1);
        assert_eq!(collection_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_syncs_each_fetch() {
        let source = ScriptedSource::pages(&[5]);
        let calls = Arc::clone(&source.product_calls);
        let orch = orchestrator(source, memory_cache()).await;

        orch.sync_catalog().await.unwrap();
        orch.sync_catalog().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_syncing_while_in_flight() {
        let source = ScriptedSource { latency: Duration::from_millis(50), ..ScriptedSource::pages(&[5]) };
        let orch = orchestrator(source, memory_cache()).await;

        let (result, observed) = tokio::join!(orch.sync_catalog(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            orch.status().await
        });

        assert!(result.is_ok());
        assert!(observed.state.is_syncing());
        assert!(!orch.status().await.state.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sync_restores_previous_state() {
        let source = ScriptedSource { latency: Duration::from_millis(50), ..ScriptedSource::pages(&[5]) };
        let cache = memory_cache();
        let orch = orchestrator(source, Arc::clone(&cache)).await;

        let timed_out = tokio::time::timeout(Duration::from_millis(10), orch.sync_catalog()).await;
        assert!(timed_out.is_err());

        let status = orch.status().await;
        assert_eq!(status.state, SyncState::NeverSynced);
        assert!(status.last_error.unwrap().message.contains("SYNC_CANCELLED"));
        assert!(cache.read_products().await.is_empty());

        let outcome = orch.sync_catalog().await.unwrap();
        assert_eq!(orch.status().await.state, SyncState::Synced { at: outcome.synced_at });
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sync_keeps_synced_state() {
        let source = ScriptedSource { latency: Duration::from_millis(50), ..ScriptedSource::pages(&[5]) };
        let orch = orchestrator(source, memory_cache()).await;
        let first = orch.sync_catalog().await.unwrap();

        tokio::select! {
            _ = orch.sync_catalog() => panic!("sync should still be fetching"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }

        assert_eq!(orch.status().await.state, SyncState::Synced { at: first.synced_at });
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_if_stale() {
        let source = ScriptedSource::pages(&[5]);
        let calls = Arc::clone(&source.product_calls);
        let orch = orchestrator(source, memory_cache()).await;
        let token = CancellationToken::new();

        assert!(orch.is_stale().await);
        assert!(orch.sync_if_stale(&token).await.unwrap().is_some());
        assert!(!orch.is_stale().await);
        assert!(orch.sync_if_stale(&token).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_reads_synced_snapshot() {
        let orch = orchestrator(ScriptedSource::pages(&[4]), memory_cache()).await;
        orch.sync_catalog().await.unwrap();

        let stats = orch.query().stats().await;
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.total_collections, 2);
    }
}
