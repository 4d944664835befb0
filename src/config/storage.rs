//! Storage configuration.

use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;

/// Which reservation store backs the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Whole board kept as one JSON blob in a local key-value store.
    #[default]
    Local,
    /// One document per slot in a shared transactional document store.
    Remote,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Key-value driver under the local backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalDriver {
    /// JSON files in a data directory.
    #[default]
    File,
    /// Process memory; lost on restart.
    Memory,
}

/// Document database driver under the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteDriver {
    /// Redis hashes with `WATCH`/`MULTI` transactions and pub/sub changes.
    #[default]
    Redis,
    /// In-process versioned document map.
    Memory,
}

impl std::fmt::Display for RemoteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Local backend configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,

    /// Remote backend configuration.
    #[serde(default)]
    pub remote: RemoteStorageConfig,
}

impl StorageConfig {
    /// Validate the storage configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration fields are missing for the selected backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            StorageBackend::Local => {
                if self.local.key.trim().is_empty() {
                    return Err(ConfigError::Message(
                        "storage.local.key cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
            StorageBackend::Remote => {
                if self.remote.collection.trim().is_empty() {
                    return Err(ConfigError::Message(
                        "storage.remote.collection cannot be empty".to_string(),
                    ));
                }
                if self.remote.max_transaction_attempts == 0 {
                    return Err(ConfigError::Message(
                        "storage.remote.max_transaction_attempts cannot be 0".to_string(),
                    ));
                }
                if self.remote.driver == RemoteDriver::Redis && self.remote.redis.url.is_empty() {
                    return Err(ConfigError::Message(
                        "storage.remote.redis.url cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Local backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    /// Key-value driver.
    #[serde(default)]
    pub driver: LocalDriver,

    /// Directory for the file driver.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key holding the serialized board.
    #[serde(default = "default_local_key")]
    pub key: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_local_key() -> String {
    "rifa_numbers_v1".to_string()
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            driver: LocalDriver::default(),
            data_dir: default_data_dir(),
            key: default_local_key(),
        }
    }
}

/// Remote backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStorageConfig {
    /// Document database driver.
    #[serde(default)]
    pub driver: RemoteDriver,

    /// Collection holding one document per slot.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Attempts before a contended claim transaction gives up.
    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,

    /// Redis driver configuration.
    #[serde(default)]
    pub redis: RedisStorageConfig,
}

fn default_collection() -> String {
    "rifa".to_string()
}

const fn default_max_transaction_attempts() -> u32 {
    5
}

impl Default for RemoteStorageConfig {
    fn default() -> Self {
        Self {
            driver: RemoteDriver::default(),
            collection: default_collection(),
            max_transaction_attempts: default_max_transaction_attempts(),
            redis: RedisStorageConfig::default(),
        }
    }
}

/// Redis storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisStorageConfig {
    /// Redis URL.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

const fn default_pool_size() -> usize {
    10
}

const fn default_connect_timeout() -> u64 {
    5
}

impl Default for RedisStorageConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_display() {
        assert_eq!(StorageBackend::Local.to_string(), "local");
        assert_eq!(StorageBackend::Remote.to_string(), "remote");
        assert_eq!(RemoteDriver::Redis.to_string(), "redis");
    }

    #[test]
    fn test_storage_config_validation() {
        let config = StorageConfig::default();
        assert!(config.validate().is_ok());

        let mut config = StorageConfig::default();
        config.local.key = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = StorageConfig {
            backend: StorageBackend::Remote,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        config.remote.redis.url = String::new();
        assert!(config.validate().is_err());

        config.remote.driver = RemoteDriver::Memory;
        assert!(config.validate().is_ok());
        config.remote.max_transaction_attempts = 0;
        assert!(config.validate().is_err());
    }
}
