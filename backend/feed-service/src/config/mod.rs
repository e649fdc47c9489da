//! Configuration for feed-service
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{FeedError, FeedResult};

/// Loaded from `FEED_`-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Path of the durable post collection (`FEED_STORE_PATH`)
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// CSV file from the first release, read while the store does not exist
    /// yet (`FEED_LEGACY_CSV_PATH`)
    #[serde(default)]
    pub legacy_csv_path: Option<PathBuf>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("posts.jsonl")
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            legacy_csv_path: None,
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> FeedResult<Self> {
        envy::prefixed("FEED_")
            .from_env()
            .map_err(|e| FeedError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_values() {
        std::env::remove_var("FEED_STORE_PATH");
        std::env::remove_var("FEED_LEGACY_CSV_PATH");
        let config = FeedConfig::from_env().unwrap();
        assert_eq!(config.store_path, PathBuf::from("posts.jsonl"));
        assert!(config.legacy_csv_path.is_none());
    }

    #[test]
    #[serial]
    fn test_store_path_from_env() {
        std::env::set_var("FEED_STORE_PATH", "/var/lib/firebox/posts.jsonl");
        let config = FeedConfig::from_env().unwrap();
        std::env::remove_var("FEED_STORE_PATH");
        assert_eq!(
            config.store_path,
            PathBuf::from("/var/lib/firebox/posts.jsonl")
        );
    }

    #[test]
    #[serial]
    fn test_legacy_csv_path_from_env() {
        std::env::set_var("FEED_LEGACY_CSV_PATH", "posts.csv");
        let config = FeedConfig::from_env().unwrap();
        std::env::remove_var("FEED_LEGACY_CSV_PATH");
        assert_eq!(config.legacy_csv_path, Some(PathBuf::from("posts.csv")));
    }
}
