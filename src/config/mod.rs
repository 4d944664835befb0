//! Configuration management module.
//!
//! Supports loading configuration from:
//! - A `.env` file in the working directory
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `RAFFLE_BOARD__<SECTION>__<KEY>` pattern

mod server;
mod storage;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use server::ServerConfig;
pub use storage::{
    LocalDriver, LocalStorageConfig, RedisStorageConfig, RemoteDriver, RemoteStorageConfig,
    StorageBackend, StorageConfig,
};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin gate configuration.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{RAFFLE_PROFILE}.toml` (if `RAFFLE_PROFILE` is set)
    /// 3. Environment variables with `RAFFLE_BOARD__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        dotenvy::dotenv().ok();

        let profile =
            std::env::var("RAFFLE_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // RAFFLE_BOARD__STORAGE__BACKEND=remote -> storage.backend = "remote"
            .add_source(
                Environment::with_prefix("RAFFLE_BOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".to_string()));
        }

        if self.admin.passphrase.is_empty() {
            return Err(ConfigError::Message(
                "admin.passphrase cannot be empty".to_string(),
            ));
        }

        self.storage.validate()?;

        Ok(())
    }
}

/// Admin gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Shared passphrase unlocking export and reset.
    #[serde(default = "default_admin_passphrase")]
    pub passphrase: String,
}

fn default_admin_passphrase() -> String {
    "admin_change_me".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            passphrase: default_admin_passphrase(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable Prometheus metrics endpoint.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}
