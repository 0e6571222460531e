//! Lifecycle of the offline cache: install, activate, intercept.
//!
//! A new version starts `Installing` and populates its bucket from the
//! manifest. Population is best-effort: every URL is fetched and stored on
//! its own, and a missing asset is logged and skipped instead of failing the
//! install. Once the host decides to switch versions it calls `activate`,
//! which deletes every bucket that does not belong to this version.
//!
//! Each entry point is an `async fn` that resolves only after all of its work
//! has settled, so the host keeps the component alive by awaiting it.

use std::fmt;

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AssetManifest, CacheStorage, StorageError, StoredResponse};
use crate::net::{FetchError, Fetcher, Response};

/// Maximum concurrent asset fetches while installing.
/// Keeps a large sharded manifest from opening dozens of sockets at once.
const MAX_CONCURRENT_INSTALLS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Activating,
    Active,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cannot go from {from} to {to}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of populating the bucket. Failures here never fail the install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<AssetFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Presence of one manifest URL in the current bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStatus {
    pub url: String,
    /// Age display of the stored entry, `None` when not cached.
    pub cached: Option<String>,
}

pub struct OfflineCache<S, F> {
    manifest: AssetManifest,
    storage: S,
    network: F,
    state: watch::Sender<WorkerState>,
}

impl<S: CacheStorage, F: Fetcher> OfflineCache<S, F> {
    /// A freshly deployed version, about to install.
    pub fn new(manifest: AssetManifest, storage: S, network: F) -> Self {
        Self::with_state(manifest, storage, network, WorkerState::Installing)
    }

    /// A version that installed and activated in an earlier run.
    pub fn resume(manifest: AssetManifest, storage: S, network: F) -> Self {
        Self::with_state(manifest, storage, network, WorkerState::Active)
    }

    fn with_state(manifest: AssetManifest, storage: S, network: F, state: WorkerState) -> Self {
        let (state, _) = watch::channel(state);
        Self {
            manifest,
            storage,
            network,
            state,
        }
    }

    pub fn version(&self) -> &str {
        self.manifest.version()
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    fn transition(&self, to: WorkerState) {
        let from = self.state.send_replace(to);
        debug!(version = self.version(), %from, %to, "Cache worker state change");
    }

    /// Populate the bucket for this version, then wait for activation.
    pub async fn install(&self) -> Result<InstallReport, CacheError> {
        let current = self.state();
        if current != WorkerState::Installing {
            return Err(CacheError::InvalidTransition {
                from: current,
                to: WorkerState::Waiting,
            });
        }

        self.storage.open(self.version()).await?;
        info!(
            version = self.version(),
            assets = self.manifest.len(),
            "Opened cache, caching assets individually"
        );

        let results: Vec<(String, Result<(), FetchError>)> = stream::iter(self.manifest.urls())
            .map(|url| async move { (url.clone(), self.cache_asset(url).await) })
            .buffered(MAX_CONCURRENT_INSTALLS)
            .collect()
            .await;

        let mut report = InstallReport::default();
        for (url, result) in results {
            match result {
                Ok(()) => report.cached.push(url),
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to cache asset");
                    report.failed.push(AssetFailure {
                        url,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            version = self.version(),
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Install complete"
        );
        self.transition(WorkerState::Waiting);
        Ok(report)
    }

    async fn cache_asset(&self, url: &str) -> Result<(), FetchError> {
        let response = self.network.fetch(url).await?.error_for_status()?;
        self.storage
            .put(self.version(), StoredResponse::from_response(response))
            .await?;
        Ok(())
    }

    /// Take over from older versions and delete their buckets.
    pub async fn activate(&self) -> Result<ActivationReport, CacheError> {
        let current = self.state();
        if current == WorkerState::Installing {
            return Err(CacheError::InvalidTransition {
                from: current,
                to: WorkerState::Activating,
            });
        }
        // A listing error leaves the state untouched.
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != self.version())
            .collect();
        self.transition(WorkerState::Activating);

        let deletions = stale.iter().map(|name| async move {
            let result = self.storage.delete(name).await;
            (name, result)
        });

        let mut report = ActivationReport::default();
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(_) => {
                    info!(bucket = %name, "Deleted stale cache");
                    report.deleted.push(name.clone());
                }
                Err(e) => {
                    warn!(bucket = %name, error = %e, "Failed to delete stale cache");
                    report.failed.push(name.clone());
                }
            }
        }

        self.transition(WorkerState::Active);
        Ok(report)
    }

    /// Cache-first: a stored response is returned verbatim without touching
    /// the network; a miss goes to the network and is not stored.
    pub async fn handle_fetch(&self, url: &str) -> Result<Response, FetchError> {
        match self.storage.lookup(self.version(), url).await {
            Ok(Some(entry)) => {
                debug!(url = url, "Serving from cache");
                return Ok(entry.to_response());
            }
            Ok(None) => {}
            Err(e) => warn!(url = url, error = %e, "Cache lookup failed, using network"),
        }
        self.network.fetch(url).await
    }

    /// Which manifest URLs are in the current bucket, and how old they are.
    pub async fn status(&self) -> Vec<AssetStatus> {
        let lookups = self.manifest.urls().iter().map(|url| async move {
            let cached = match self.storage.lookup(self.version(), url).await {
                Ok(entry) => entry.map(|e| e.age_display()),
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to read cache entry");
                    None
                }
            };
            AssetStatus {
                url: url.clone(),
                cached,
            }
        });
        join_all(lookups).await
    }
}

#[async_trait]
impl<S: CacheStorage, F: Fetcher> Fetcher for OfflineCache<S, F> {
    async fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        self.handle_fetch(url).await
    }
}
