//! Dictionary loading.
//!
//! `DataLoader` fetches every configured resource and builds the
//! `DictionarySet`. A resource that cannot be fetched or parsed becomes an
//! empty dictionary; loading as a whole never fails.

pub mod data_loader;

pub use data_loader::DataLoader;
