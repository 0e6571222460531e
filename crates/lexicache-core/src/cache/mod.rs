//! Offline asset cache.
//!
//! This module provides the `OfflineCache` that keeps a single versioned
//! bucket of byte-exact responses for the `AssetManifest`, answers fetches
//! cache-first, and deletes buckets left behind by older versions.
//!
//! Buckets live in a `CacheStorage` backend:
//! - `MemoryStorage` for tests and embedding
//! - `DiskStorage` for buckets that survive restarts

pub mod disk;
pub mod entry;
pub mod manifest;
pub mod storage;
pub mod worker;

pub use disk::DiskStorage;
pub use entry::StoredResponse;
pub use manifest::AssetManifest;
pub use storage::{CacheStorage, MemoryStorage, StorageError};
pub use worker::{
    ActivationReport, AssetFailure, AssetStatus, CacheError, InstallReport, OfflineCache,
    WorkerState,
};
