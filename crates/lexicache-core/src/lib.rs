//! lexicache-core - offline dictionary browsing.
//!
//! - `loader`: fetch configured dictionaries into a `DictionarySet`
//! - `cache`: versioned offline asset cache with cache-first fetching
//! - `browser`: prefix search and full listings over loaded dictionaries
//! - `config`: on-disk configuration and the default dictionary sources

pub mod browser;
pub mod cache;
pub mod config;
pub mod loader;
pub mod models;
pub mod net;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use browser::{DictionaryBrowser, SearchOutcome};
pub use cache::{AssetManifest, DiskStorage, MemoryStorage, OfflineCache, WorkerState};
pub use config::Config;
pub use loader::DataLoader;
pub use models::{Dictionary, DictionarySet, ResourceDescriptor, ResourceShape};
pub use net::{FetchError, Fetcher, HttpFetcher};
