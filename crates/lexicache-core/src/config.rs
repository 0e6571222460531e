//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the site the dictionaries are served from, the offline cache version,
//! the asset list and the dictionary sources.
//!
//! Configuration is stored at `~/.config/lexicache/config.json`. Missing
//! fields fall back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::AssetManifest;
use crate::models::ResourceDescriptor;
use crate::net::client::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "lexicache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "LEXICACHE_BASE_URL";

/// Environment variable overriding `cache_dir`
pub const ENV_CACHE_DIR: &str = "LEXICACHE_CACHE_DIR";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/pwa2/";

/// Bump on every deployed update so installs start from a fresh bucket.
const DEFAULT_CACHE_VERSION: &str = "dictionary-pwa-cache-v1";

/// Letters that have a Soomaali Mansuur shard (no p, v or z).
const SOOMAALI_SHARDS: &str = "abcdefghijklmnoqrstuwxy";

const DEFAULT_ASSETS: &[&str] = &[
    "",
    "index.html",
    "style.css",
    "app.js",
    "manifest.json",
    "icons/icon-192x192.png",
    "icons/icon-512x512.png",
    "icons/screen1.jpg",
    "icons/screen2.jpg",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cache_version: String,
    /// Page assets and icons, relative to `base_url`.
    pub assets: Vec<String>,
    pub dictionaries: Vec<ResourceDescriptor>,
    pub request_timeout_secs: u64,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            dictionaries: vec![
                ResourceDescriptor::single("Biology", "dictionaries/biology.json"),
                ResourceDescriptor::single("Physics", "dictionaries/physics.json"),
                ResourceDescriptor::single("Geography", "dictionaries/geography.json"),
                ResourceDescriptor::sharded_by_letter(
                    "Soomaali Mansuur",
                    "dictionaries/soomaali_mansuur/",
                    SOOMAALI_SHARDS,
                ),
            ],
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `LEXICACHE_*` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = base;
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("Invalid base URL: {}", self.base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where cache buckets are stored.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn manifest(&self) -> Result<AssetManifest> {
        let base = self.base_url()?;
        AssetManifest::from_sources(&self.cache_version, &base, &self.assets, &self.dictionaries)
            .context("Invalid asset locator")
    }
}
