//! Local catalog cache.
//!
//! The catalog snapshot lives behind a [`CacheStore`] capability so it can be
//! backed by SQLite (via tokio-rusqlite, WAL mode, tracked migrations) or held
//! in memory.

pub mod catalog;
pub mod connection;
pub mod entries;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use catalog::{CacheKeys, CatalogCache};
pub use connection::CacheDb;
pub use store::{CacheStore, MemoryCacheStore};
