use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{Dictionary, DictionarySet, ResourceDescriptor, ResourceShape};
use crate::net::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::net::{FetchError, Fetcher};
use crate::utils::resolve_locator;

pub struct DataLoader<F> {
    fetcher: F,
    base: Url,
    timeout: Duration,
}

impl<F: Fetcher> DataLoader<F> {
    pub fn new(fetcher: F, base: Url) -> Self {
        Self {
            fetcher,
            base,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Deadline for each individual fetch. A resource that does not answer in
    /// time loads as empty.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load every descriptor. Fetches start in configuration order and run
    /// concurrently; the result keeps configuration order and has an entry
    /// for every descriptor name.
    pub async fn load_all(&self, config: &[ResourceDescriptor]) -> DictionarySet {
        let loaded = join_all(config.iter().map(|desc| self.load_descriptor(desc))).await;

        let mut set = DictionarySet::new();
        for (desc, dictionary) in config.iter().zip(loaded) {
            if set.get(&desc.name).is_some() {
                warn!(dictionary = %desc.name, "Duplicate dictionary name, keeping the later one");
            }
            set.insert(desc.name.clone(), dictionary);
        }

        info!(
            dictionaries = set.len(),
            terms = set.total_terms(),
            "All dictionaries loaded"
        );
        set
    }

    async fn load_descriptor(&self, desc: &ResourceDescriptor) -> Dictionary {
        match &desc.shape {
            ResourceShape::Single => match self.fetch_dictionary(&desc.locator).await {
                Ok(dictionary) => dictionary,
                Err(e) => {
                    warn!(dictionary = %desc.name, error = %e, "Failed to load dictionary");
                    Dictionary::new()
                }
            },
            ResourceShape::Sharded { shard_keys } => self.load_sharded(desc, shard_keys).await,
        }
    }

    /// Fetch all shards together and merge the ones that arrived. Shards are
    /// merged in key order, so a term present in two shards takes the value
    /// from the later key.
    async fn load_sharded(&self, desc: &ResourceDescriptor, shard_keys: &[String]) -> Dictionary {
        let shards = shard_keys
            .iter()
            .map(|key| async move { self.fetch_dictionary(&desc.shard_locator(key)).await });
        let results = join_all(shards).await;

        let mut merged = Dictionary::new();
        let mut failed = 0;
        for (key, result) in shard_keys.iter().zip(results) {
            match result {
                Ok(shard) => merged.merge(shard),
                Err(e) => {
                    failed += 1;
                    debug!(dictionary = %desc.name, shard = %key, error = %e, "Shard unavailable");
                }
            }
        }

        if failed > 0 {
            warn!(
                dictionary = %desc.name,
                failed = failed,
                total = shard_keys.len(),
                "Some shards failed to load"
            );
        }
        merged
    }

    async fn fetch_dictionary(&self, locator: &str) -> Result<Dictionary, FetchError> {
        let url = resolve_locator(&self.base, locator).map_err(|source| FetchError::InvalidUrl {
            url: locator.to_string(),
            source,
        })?;

        let response = tokio::time::timeout(self.timeout, self.fetcher.fetch(&url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.clone(),
                secs: self.timeout.as_secs(),
            })??
            .error_for_status()?;

        Dictionary::from_json(&response.body)
            .map_err(|e| FetchError::invalid_body(&url, &e, &response.body))
    }
}
