//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CHAMELEO_*)
//! 2. TOML config file (if CHAMELEO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CHAMELEO_*)
/// 2. TOML config file (if CHAMELEO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storefront root serving the product and collection feeds.
    ///
    /// Set via CHAMELEO_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the paginated products feed.
    #[serde(default = "default_products_path")]
    pub products_path: String,

    /// Path of the collections feed.
    #[serde(default = "default_collections_path")]
    pub collections_path: String,

    /// Records requested per product page.
    ///
    /// Set via CHAMELEO_PAGE_SIZE environment variable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause between product page requests in milliseconds.
    ///
    /// Set via CHAMELEO_PAGE_DELAY_MS environment variable.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Upper bound on product pages fetched in one sync.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via CHAMELEO_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Path to SQLite cache database.
    ///
    /// Set via CHAMELEO_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix for cache keys (`<namespace>_products`, ...).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Age in hours after which the cached catalog counts as stale.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,

    /// Run a sync at startup when the cache is stale.
    ///
    /// Set via CHAMELEO_SYNC_ON_START environment variable.
    #[serde(default)]
    pub sync_on_start: bool,
}

fn default_base_url() -> String {
    "https://chameleo.shop".into()
}

fn default_products_path() -> String {
    "/products.json".into()
}

fn default_collections_path() -> String {
    "/collections.json".into()
}

fn default_page_size() -> u32 {
    250
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_max_pages() -> u32 {
    100
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "chameleo-catalog/0.1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./chameleo-catalog.sqlite")
}

fn default_namespace() -> String {
    "chameleo".into()
}

fn default_stale_after_hours() -> u32 {
    24
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            products_path: default_products_path(),
            collections_path: default_collections_path(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            max_pages: default_max_pages(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            db_path: default_db_path(),
            namespace: default_namespace(),
            stale_after_hours: default_stale_after_hours(),
            sync_on_start: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Staleness threshold.
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.stale_after_hours))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CHAMELEO_`
    /// 2. TOML file from `CHAMELEO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CHAMELEO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CHAMELEO_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://chameleo.shop");
        assert_eq!(config.products_path, "/products.json");
        assert_eq!(config.collections_path, "/collections.json");
        assert_eq!(config.page_size, 250);
        assert_eq!(config.page_delay_ms, 500);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.db_path, PathBuf::from("./chameleo-catalog.sqlite"));
        assert_eq!(config.namespace, "chameleo");
        assert_eq!(config.stale_after_hours, 24);
        assert!(!config.sync_on_start);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.page_delay(), Duration::from_millis(500));
        assert_eq!(config.stale_after(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
                base_url = "https://staging.chameleo.shop"
                page_size = 50
                namespace = "staging"
            "#,
        ));

        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.base_url, "https://staging.chameleo.shop");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.namespace, "staging");
        assert_eq!(config.page_delay_ms, 500);
    }

    #[test]
    fn test_extract_rejects_invalid_layer() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("page_size = 0"));
        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "page_size"));
    }
}
