//! CLI command implementations.

pub mod resume_point;
pub mod search;
pub mod sync;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::application::ReaderOptions;
use crate::domain::models::{Config, TestGroupConfig};

/// Reader tuning taken from configuration
pub fn reader_options(config: &Config) -> ReaderOptions {
    let secs = i64::try_from(config.sync.reprocess_window_secs).unwrap_or(i64::MAX);
    ReaderOptions {
        project: config.result_store.project.clone(),
        query: config.result_store.query.clone(),
        reprocess: Duration::try_seconds(secs).unwrap_or(Duration::MAX),
        fetch_concurrency: config.sync.fetch_concurrency,
    }
}

/// Look up a configured test group by name
pub fn find_group<'a>(config: &'a Config, name: &str) -> Result<&'a TestGroupConfig> {
    config.test_group(name).with_context(|| {
        let known: Vec<&str> = config.test_groups.iter().map(|g| g.name.as_str()).collect();
        format!("Unknown test group {name:?} (configured: {})", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_options_from_config() {
        let mut config = Config::default();
        config.result_store.project = "proj".to_string();
        config.sync.reprocess_window_secs = 3600;
        config.sync.fetch_concurrency = 3;

        let options = reader_options(&config);
        assert_eq!(options.project, "proj");
        assert_eq!(options.reprocess, Duration::hours(1));
        assert_eq!(options.fetch_concurrency, 3);
        assert_eq!(options.query, config.result_store.query);
    }

    #[test]
    fn test_find_group_lists_known_groups() {
        let mut config = Config::default();
        config.test_groups = vec![TestGroupConfig {
            name: "ci-unit".to_string(),
            ..TestGroupConfig::default()
        }];

        assert!(find_group(&config, "ci-unit").is_ok());
        let err = find_group(&config, "nope").expect_err("unknown group");
        assert!(err.to_string().contains("ci-unit"));
    }
}
