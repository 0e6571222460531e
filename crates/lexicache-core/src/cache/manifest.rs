//! The fixed list of URLs the offline cache tries to hold.

use std::collections::HashSet;

use url::Url;

use crate::models::ResourceDescriptor;
use crate::utils::resolve_locator;

/// Versioned list of absolute asset URLs. The version doubles as the name of
/// the cache bucket, so it must change with every deployed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    version: String,
    urls: Vec<String>,
}

impl AssetManifest {
    /// Build a manifest from absolute URLs. Duplicates keep their first position.
    pub fn new<I, U>(version: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        let mut seen = HashSet::new();
        let urls = urls
            .into_iter()
            .map(Into::into)
            .filter(|url: &String| seen.insert(url.clone()))
            .collect();
        Self {
            version: version.into(),
            urls,
        }
    }

    /// Core assets first, then every dictionary file with shards expanded.
    pub fn from_sources(
        version: impl Into<String>,
        base: &Url,
        assets: &[String],
        dictionaries: &[ResourceDescriptor],
    ) -> Result<Self, url::ParseError> {
        let locators = assets
            .iter()
            .cloned()
            .chain(dictionaries.iter().flat_map(ResourceDescriptor::locators));
        let urls = locators
            .map(|locator| resolve_locator(base, &locator))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(version, urls))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
