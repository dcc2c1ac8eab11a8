//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `base_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `base_url` is not an http(s) URL
    /// - `page_size` is outside 1..=250
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `page_delay_ms` exceeds one minute
    /// - `max_pages` or `stale_after_hours` is 0
    /// - `user_agent` is empty
    /// - `namespace` is empty or contains characters other than ASCII
    ///   alphanumerics, `-` and `_`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "base_url".into(),
                hint: "Set CHAMELEO_BASE_URL environment variable".into(),
            });
        }
        match url::Url::parse(&self.base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("base_url", "scheme must be http or https")),
            Err(e) => return Err(invalid("base_url", &e.to_string())),
        }

        if self.page_size == 0 || self.page_size > 250 {
            return Err(invalid("page_size", "must be between 1 and 250"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.page_delay_ms > 60_000 {
            return Err(invalid("page_delay_ms", "must not exceed one minute (60000ms)"));
        }

        if self.max_pages == 0 {
            return Err(invalid("max_pages", "must be greater than 0"));
        }

        if self.stale_after_hours == 0 {
            return Err(invalid("stale_after_hours", "must be at least 1"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.namespace.is_empty() {
            return Err(invalid("namespace", "must not be empty"));
        }
        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("namespace", "may only contain ASCII letters, digits, '-' and '_'"));
        }

        if self.page_delay_ms == 0 {
            tracing::warn!("page_delay_ms is 0; product pages will be requested back to back");
        }

        Ok(())
    }
}
