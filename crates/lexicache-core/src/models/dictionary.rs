//! In-memory dictionaries.
//!
//! A `Dictionary` keeps terms in the order they appear in the source JSON,
//! which is the order search results are reported in. A `DictionarySet`
//! keeps dictionaries in configuration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from term to definition. Keys are stored exactly as published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary {
    terms: IndexMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat JSON object of term → definition.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn insert(&mut self, term: impl Into<String>, definition: impl Into<String>) {
        self.terms.insert(term.into(), definition.into());
    }

    /// Union with `other`. On overlapping terms the value from `other` wins.
    pub fn merge(&mut self, other: Dictionary) {
        self.terms.extend(other.terms);
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    /// Case-insensitive lookup; the first term in source order wins.
    pub fn lookup(&self, term: &str) -> Option<(&str, &str)> {
        let wanted = term.to_lowercase();
        self.iter().find(|(t, _)| t.to_lowercase() == wanted)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(t, d)| (t.as_str(), d.as_str()))
    }
}

impl<T: Into<String>, D: Into<String>> FromIterator<(T, D)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (T, D)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (term, definition) in iter {
            dict.insert(term, definition);
        }
        dict
    }
}

/// Every configured dictionary by name. Names that failed to load map to an
/// empty `Dictionary` rather than being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionarySet {
    dictionaries: IndexMap<String, Dictionary>,
}

impl DictionarySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, dictionary: Dictionary) {
        self.dictionaries.insert(name.into(), dictionary);
    }

    pub fn get(&self, name: &str) -> Option<&Dictionary> {
        self.dictionaries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dictionary)> {
        self.dictionaries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    pub fn total_terms(&self) -> usize {
        self.dictionaries.values().map(Dictionary::len).sum()
    }
}

/// A single term shown when browsing one dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub term: String,
    pub definition: String,
}

/// A search match, tagged with the dictionary it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub term: String,
    pub definition: String,
    pub dictionary: String,
}
