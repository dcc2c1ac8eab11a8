//! Storefront base URL.

use std::fmt;

/// Error type for storefront URL failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// A validated storefront root that feed paths are joined onto.
///
/// Parsing trims whitespace, defaults the scheme to https, lowercases the
/// host, and drops query, fragment and trailing slashes. A path prefix
/// (`https://shop.example/eu`) is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontUrl(url::Url);

impl StorefrontUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
        let mut url = url::Url::parse(&with_scheme).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| UrlError::InvalidUrl(format!("{trimmed} has no host")))?;
        url.set_host(Some(&host)).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

        url.set_query(None);
        url.set_fragment(None);
        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&path);

        Ok(Self(url))
    }

    /// The feed URL for `path` (e.g. `/products.json`) under this root.
    pub fn endpoint(&self, path: &str) -> url::Url {
        let mut url = self.0.clone();
        url.set_path(&format!("{}/{}", self.0.path().trim_end_matches('/'), path.trim_start_matches('/')));
        url
    }

    pub fn as_url(&self) -> &url::Url {
        &self.0
    }
}

impl fmt::Display for StorefrontUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}
