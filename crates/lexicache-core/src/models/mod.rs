//! Data models for dictionaries and their configured sources.
//!
//! - `ResourceDescriptor`, `ResourceShape`: where a dictionary is fetched from
//! - `Dictionary`, `DictionarySet`: the in-memory term → definition mappings
//! - `Entry`, `SearchHit`: rows handed to the presentation layer

pub mod dictionary;
pub mod resource;

pub use dictionary::{Dictionary, DictionarySet, Entry, SearchHit};
pub use resource::{ResourceDescriptor, ResourceShape};
