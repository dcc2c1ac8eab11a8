//! Canonical catalog types, sync lifecycle and the query layer.

pub mod model;
pub mod query;
pub mod state;

pub use model::{CatalogSnapshot, Collection, Image, Product, Variant};
pub use query::{
    AvailabilityFilter, AvailabilityInput, CatalogQuery, CatalogStats, LastSyncStatus, ProductFilters, ProductPage,
};
pub use state::{SyncFailure, SyncState, SyncStatus};

#[cfg(test)]
pub(crate) use model::fixtures;
