//! Core types and shared functionality for the Chameleo catalog service.
//!
//! This crate provides:
//! - Canonical product and collection records
//! - The local catalog cache (SQLite or in-memory backed)
//! - The read-only query layer over the cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheStore, CatalogCache, MemoryCacheStore};
pub use catalog::{
    CatalogQuery, CatalogSnapshot, CatalogStats, Collection, Product, ProductFilters, ProductPage, SyncState,
    SyncStatus,
};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
