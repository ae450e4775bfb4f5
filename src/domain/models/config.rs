use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::test_group::TestGroupConfig;

/// Main configuration structure for the updater
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// ResultStore connection settings
    #[serde(default)]
    pub result_store: ResultStoreConfig,

    /// Sync cycle tuning
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dashboard groups to update
    #[serde(default)]
    pub test_groups: Vec<TestGroupConfig>,
}

impl Config {
    /// Look up a test group by name.
    pub fn test_group(&self, name: &str) -> Option<&TestGroupConfig> {
        self.test_groups.iter().find(|group| group.name == name)
    }
}

/// ResultStore connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResultStoreConfig {
    /// Base URL of the ResultStore REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Google Cloud project the invocations are recorded under
    #[serde(default)]
    pub project: String,

    /// Environment variable holding the OAuth bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Search query the resume timestamp is appended to
    #[serde(default = "default_query")]
    pub query: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Requests per second allowed against the API
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Initial retry backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum retry backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Give up retrying a request after this many milliseconds
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
}

fn default_base_url() -> String {
    "https://resultstore.googleapis.com".to_string()
}

fn default_token_env() -> String {
    "RESULTSTORE_TOKEN".to_string()
}

fn default_query() -> String {
    crate::services::resume_point::QUERY_PROW.to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

const fn default_max_elapsed_ms() -> u64 {
    120_000
}

impl Default for ResultStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project: String::new(),
            token_env: default_token_env(),
            query: default_query(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_elapsed_ms: default_max_elapsed_ms(),
        }
    }
}

/// Sync cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Invocations fetched concurrently
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Always re-query at least this far back, in seconds
    #[serde(default)]
    pub reprocess_window_secs: u64,

    /// Capacity of the column output channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_fetch_concurrency() -> usize {
    8
}

const fn default_channel_capacity() -> usize {
    16
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: default_fetch_concurrency(),
            reprocess_window_secs: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
