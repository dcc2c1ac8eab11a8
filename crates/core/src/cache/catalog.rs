//! Namespaced catalog snapshot over a [`CacheStore`].
//!
//! Three entries make up one snapshot: `<namespace>_products`,
//! `<namespace>_collections` and `<namespace>_last_sync`. Writes replace all
//! three together; reads degrade missing or corrupt entries to empty.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use super::store::CacheStore;
use crate::Error;
use crate::catalog::{CatalogSnapshot, Collection, Product};

/// Keys that hold one namespace's snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub products: String,
    pub collections: String,
    pub last_sync: String,
}

impl CacheKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            products: format!("{namespace}_products"),
            collections: format!("{namespace}_collections"),
            last_sync: format!("{namespace}_last_sync"),
        }
    }

    /// Every key of the snapshot.
    pub fn all(&self) -> Vec<String> {
        vec![self.products.clone(), self.collections.clone(), self.last_sync.clone()]
    }
}

/// The local catalog cache.
#[derive(Debug)]
pub struct CatalogCache<S> {
    store: S,
    keys: CacheKeys,
}

impl<S: CacheStore> CatalogCache<S> {
    pub fn new(store: S, namespace: &str) -> Self {
        Self { store, keys: CacheKeys::new(namespace) }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the cached snapshot and stamp it with the current time.
    ///
    /// Both lists are serialized before storage is touched, and the three
    /// entries are written in a single all-or-nothing call. On error the
    /// previous snapshot is left intact.
    pub async fn write(&self, products: &[Product], collections: &[Collection]) -> Result<DateTime<Utc>, Error> {
        let products_json = serde_json::to_string(products)?;
        let collections_json = serde_json::to_string(collections)?;
        let synced_at = Utc::now();

        self.store
            .put_all(vec![
                (self.keys.products.clone(), products_json),
                (self.keys.collections.clone(), collections_json),
                (self.keys.last_sync.clone(), synced_at.to_rfc3339()),
            ])
            .await?;

        tracing::debug!(
            products = products.len(),
            collections = collections.len(),
            "catalog snapshot written"
        );

        Ok(synced_at)
    }

    /// Cached products, or an empty list if absent or unreadable.
    pub async fn read_products(&self) -> Vec<Product> {
        self.read_list(&self.keys.products).await
    }

    /// Cached collections, or an empty list if absent or unreadable.
    pub async fn read_collections(&self) -> Vec<Collection> {
        self.read_list(&self.keys.collections).await
    }

    /// Time of the last committed snapshot.
    pub async fn read_last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.read_raw(&self.keys.last_sync).await?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(key = %self.keys.last_sync, error = %e, "ignoring unreadable last-sync stamp");
                None
            }
        }
    }

    pub async fn read_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            products: self.read_products().await,
            collections: self.read_collections().await,
            last_sync: self.read_last_sync().await,
        }
    }

    /// Drop the namespace's snapshot entirely.
    ///
    /// Only the snapshot's own keys are removed; a namespace that merely
    /// shares this one's leading characters is untouched.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.store.remove(self.keys.all()).await
    }

    async fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; treating entry as empty");
                None
            }
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.read_raw(key).await else {
            return Vec::new();
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "corrupt cache entry; treating as empty");
            Vec::new()
        })
    }
}
