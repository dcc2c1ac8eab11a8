//! Remote catalog source.
//!
//! ### Feed contract
//!
//! - **Products**: `GET {base}{products_path}?page=N&limit=L` answering
//!   `{ "products": [...] }`. Pages start at 1; a page shorter than `L`
//!   (or empty) marks the end of the catalog.
//! - **Collections**: `GET {base}{collections_path}` answering
//!   `{ "collections": [...] }`, assumed to fit in one response.
//! - Any non-2xx status is fatal for the request; nothing is retried.
//!
//! Records are returned as loosely-typed JSON; see [`raw`] and
//! [`crate::normalize`] for how they become canonical records.

pub mod raw;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use chameleo_core::{AppConfig, Error};

pub use self::url::{StorefrontUrl, UrlError};

/// Where catalog records come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of product records. Pages are 1-based.
    async fn fetch_products_page(&self, page: u32, limit: u32) -> Result<Vec<Value>, Error>;

    /// Fetch every collection record in a single request.
    async fn fetch_collections(&self) -> Result<Vec<Value>, Error>;
}

/// Configuration for the HTTP catalog source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Storefront root, e.g. `https://chameleo.shop`.
    pub base_url: String,
    /// Products feed path (default: `/products.json`).
    pub products_path: String,
    /// Collections feed path (default: `/collections.json`).
    pub collections_path: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User agent string (default: `chameleo-catalog/0.1`).
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SourceConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            products_path: config.products_path.clone(),
            collections_path: config.collections_path.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    products: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CollectionsEnvelope {
    collections: Vec<Value>,
}

/// Storefront JSON feed client.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    http: Client,
    base_url: StorefrontUrl,
    config: SourceConfig,
}

impl HttpCatalogSource {
    /// Create a new source with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, Error> {
        let base_url =
            StorefrontUrl::parse(&config.base_url).map_err(|e| Error::InvalidInput(format!("base_url: {e}")))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed {
                endpoint: base_url.to_string(),
                page: None,
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, base_url, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &StorefrontUrl {
        &self.base_url
    }

    /// GET an endpoint and decode its JSON body, mapping every failure to an
    /// error that names the endpoint and page.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self, path: &str, page: Option<u32>, query: &[(&str, String)],
    ) -> Result<T, Error> {
        let start = Instant::now();
        let url = self.base_url.endpoint(path);

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::FetchFailed {
                endpoint: path.to_string(),
                page,
                reason: if e.is_timeout() { "request timed out".to_string() } else { e.to_string() },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError { endpoint: path.to_string(), page, status: status.as_u16() });
        }

        let bytes = response.bytes().await.map_err(|e| Error::FetchFailed {
            endpoint: path.to_string(),
            page,
            reason: format!("failed to read response: {e}"),
        })?;

        tracing::debug!(
            url = %url,
            page,
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched catalog feed"
        );

        serde_json::from_slice(&bytes).map_err(|e| Error::ParseFailed {
            endpoint: path.to_string(),
            page,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_products_page(&self, page: u32, limit: u32) -> Result<Vec<Value>, Error> {
        let envelope: ProductsEnvelope = self
            .get_json(
                &self.config.products_path,
                Some(page),
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(envelope.products)
    }

    async fn fetch_collections(&self) -> Result<Vec<Value>, Error> {
        let envelope: CollectionsEnvelope = self.get_json(&self.config.collections_path, None, &[]).await?;
        Ok(envelope.collections)
    }
}
