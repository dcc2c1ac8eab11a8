//! Storage backends for the catalog cache.
//!
//! [`CacheStore`] is the capability the catalog cache is written against:
//! string keys, string values, and an all-or-nothing multi-key write.
//! [`CacheDb`] is the durable backend; [`MemoryCacheStore`] backs tests and
//! short-lived processes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::connection::CacheDb;
use crate::Error;

/// Key-value persistence used by [`super::CatalogCache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store every entry, or none of them.
    async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), Error>;

    /// Remove the entries stored under exactly these keys.
    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.get_entry(key).await
    }

    async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        self.put_entries(entries).await
    }

    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error> {
        self.delete_entries(keys).await
    }
}

/// In-memory [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail without touching stored entries.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a raw value, bypassing serialization. Useful for seeding corrupt entries.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(key.into(), value.into());
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_all(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Serialization("memory store configured to reject writes".into()));
        }

        let mut guard = self.entries.write().await;
        guard.extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error> {
        let mut guard = self.entries.write().await;
        let mut removed = 0;
        for key in &keys {
            if guard.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
