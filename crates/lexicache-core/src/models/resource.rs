//! Static description of a dictionary source.

use serde::{Deserialize, Serialize};

/// File extension appended to every shard key.
const SHARD_EXTENSION: &str = ".json";

/// How a dictionary is laid out on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ResourceShape {
    /// One JSON file holding the whole dictionary.
    Single,
    /// One JSON file per shard key, all under a common locator prefix.
    Sharded { shard_keys: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    /// A file path for `Single`, a directory prefix for `Sharded`.
    pub locator: String,
    #[serde(flatten)]
    pub shape: ResourceShape,
}

impl ResourceDescriptor {
    pub fn single(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            shape: ResourceShape::Single,
        }
    }

    pub fn sharded<I, K>(name: impl Into<String>, locator: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            locator: locator.into(),
            shape: ResourceShape::Sharded {
                shard_keys: keys.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Sharded descriptor with one shard per character of `letters`.
    pub fn sharded_by_letter(
        name: impl Into<String>,
        locator: impl Into<String>,
        letters: &str,
    ) -> Self {
        Self::sharded(name, locator, letters.chars().map(String::from))
    }

    pub fn is_sharded(&self) -> bool {
        matches!(self.shape, ResourceShape::Sharded { .. })
    }

    /// Locator of a single shard: `locator + key + ".json"`.
    pub fn shard_locator(&self, key: &str) -> String {
        format!("{}{}{}", self.locator, key, SHARD_EXTENSION)
    }

    /// Every locator this descriptor fetches, shards expanded in key order.
    pub fn locators(&self) -> Vec<String> {
        match &self.shape {
            ResourceShape::Single => vec![self.locator.clone()],
            ResourceShape::Sharded { shard_keys } => {
                shard_keys.iter().map(|key| self.shard_locator(key)).collect()
            }
        }
    }
}
