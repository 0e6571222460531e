//! Read-only queries over loaded dictionaries.
//!
//! `DictionaryBrowser` owns the `DictionarySet` once loading has finished and
//! answers prefix searches across every dictionary and full listings of one.

use crate::models::{DictionarySet, Entry, SearchHit};
use crate::utils::cmp_locale;

/// Shown before anything has been typed.
pub const SEARCH_PLACEHOLDER: &str = "Search results will appear here.";

/// Shown when a dictionary has no entries.
pub const EMPTY_DICTIONARY_PLACEHOLDER: &str = "This dictionary is empty or failed to load.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query was empty or whitespace.
    NoQuery,
    NoResults { query: String },
    Matches(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Matches(hits) => hits,
            _ => &[],
        }
    }

    /// Text to show instead of results, if any.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            SearchOutcome::NoQuery => Some(SEARCH_PLACEHOLDER.to_string()),
            SearchOutcome::NoResults { query } => {
                Some(format!("No results found for \"{}\".", query))
            }
            SearchOutcome::Matches(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryBrowser {
    dictionaries: DictionarySet,
}

impl DictionaryBrowser {
    pub fn new(dictionaries: DictionarySet) -> Self {
        Self { dictionaries }
    }

    pub fn dictionaries(&self) -> &DictionarySet {
        &self.dictionaries
    }

    pub fn dictionary_names(&self) -> Vec<&str> {
        self.dictionaries.names().collect()
    }

    /// Case-insensitive prefix search. Results follow dictionary order, then
    /// the order terms appear in each dictionary.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchOutcome::NoQuery;
        }

        let needle = query.as_str();
        let hits: Vec<SearchHit> = self
            .dictionaries
            .iter()
            .flat_map(|(name, dictionary)| {
                dictionary
                    .iter()
                    .filter(move |(term, _)| term.to_lowercase().starts_with(needle))
                    .map(move |(term, definition)| SearchHit {
                        term: term.to_string(),
                        definition: definition.to_string(),
                        dictionary: name.to_string(),
                    })
            })
            .collect();

        if hits.is_empty() {
            SearchOutcome::NoResults { query }
        } else {
            SearchOutcome::Matches(hits)
        }
    }

    /// Every entry of one dictionary, sorted by term. Unknown names list as
    /// empty.
    pub fn list_entries(&self, name: &str) -> Vec<Entry> {
        let Some(dictionary) = self.dictionaries.get(name) else {
            return Vec::new();
        };

        let mut entries: Vec<Entry> = dictionary
            .iter()
            .map(|(term, definition)| Entry {
                term: term.to_string(),
                definition: definition.to_string(),
            })
            .collect();
        entries.sort_by(|a, b| cmp_locale(&a.term, &b.term));
        entries
    }
}
