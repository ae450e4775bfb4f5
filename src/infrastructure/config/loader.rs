use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding the project configuration files
pub const CONFIG_DIR: &str = ".resultstore-updater";

/// Prefix for environment overrides, e.g. `RSU_RESULT_STORE__PROJECT`
pub const ENV_PREFIX: &str = "RSU_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Invalid fetch_concurrency: {0}. Must be at least 1")]
    InvalidFetchConcurrency(usize),

    #[error("Invalid channel_capacity: {0}. Must be at least 1")]
    InvalidChannelCapacity(usize),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("ResultStore base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Test group name cannot be empty")]
    EmptyGroupName,

    #[error("Duplicate test group name: {0}")]
    DuplicateGroupName(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .resultstore-updater/config.yaml
    /// 3. .resultstore-updater/local.yaml (optional overrides)
    /// 4. Environment variables (RSU_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Same as [`ConfigLoader::load`] with the config directory under `root`.
    pub fn load_from_dir(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.sync.fetch_concurrency == 0 {
            return Err(ConfigError::InvalidFetchConcurrency(config.sync.fetch_concurrency));
        }

        if config.sync.channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(config.sync.channel_capacity));
        }

        let store = &config.result_store;
        if store.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        if store.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(store.requests_per_second));
        }

        if store.initial_backoff_ms >= store.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                store.initial_backoff_ms,
                store.max_backoff_ms,
            ));
        }

        let mut seen = HashSet::new();
        for group in &config.test_groups {
            if group.name.is_empty() {
                return Err(ConfigError::EmptyGroupName);
            }
            if !seen.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroupName(group.name.clone()));
            }
        }

        Ok(())
    }
}
