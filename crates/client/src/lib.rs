//! Client code for the Chameleo catalog service.
//!
//! This crate provides the remote catalog source, record normalization, and
//! the sync orchestrator that keeps the local cache fresh.

pub mod normalize;
pub mod source;
pub mod sync;

pub use normalize::{normalize_collection, normalize_collections, normalize_product, normalize_products};
pub use source::{CatalogSource, HttpCatalogSource, SourceConfig};
pub use sync::{SyncConfig, SyncOrchestrator, SyncOutcome, is_stale_at};
