//! Configuration Module
//!
//! Loads cache settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StorageError;
use crate::storage::{FileStorage, MemoryStorage, StorageEngine};

/// Cache configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds of the API configuration cache
    pub configuration_ttl: u64,
    /// TTL in seconds of the genre list cache
    pub genres_ttl: u64,
    /// Directory for durable paged stores; None keeps them in memory
    pub storage_dir: Option<PathBuf>,
    /// Number of pages the demo session loads
    pub demo_pages: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CONFIGURATION_TTL` - Configuration cache TTL in seconds (default: 86400)
    /// - `GENRES_TTL` - Genre cache TTL in seconds (default: 86400)
    /// - `CACHE_STORAGE_DIR` - Directory for durable page storage (default: in-memory)
    /// - `DEMO_PAGES` - Pages fetched by the demo binary (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            configuration_ttl: parse_var("CONFIGURATION_TTL").unwrap_or(defaults.configuration_ttl),
            genres_ttl: parse_var("GENRES_TTL").unwrap_or(defaults.genres_ttl),
            storage_dir: env::var_os("CACHE_STORAGE_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            demo_pages: parse_var("DEMO_PAGES").unwrap_or(defaults.demo_pages),
        }
    }

    pub fn configuration_ttl(&self) -> Duration {
        Duration::from_secs(self.configuration_ttl)
    }

    pub fn genres_ttl(&self) -> Duration {
        Duration::from_secs(self.genres_ttl)
    }

    /// Builds the storage engine the paged stores persist through.
    pub async fn storage(&self) -> Result<Arc<dyn StorageEngine>, StorageError> {
        let storage: Arc<dyn StorageEngine> = match &self.storage_dir {
            Some(dir) => Arc::new(FileStorage::open(dir).await?),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            configuration_ttl: 86_400,
            genres_ttl: 86_400,
            storage_dir: None,
            demo_pages: 3,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
