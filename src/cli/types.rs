//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resultstore-updater")]
#[command(about = "Turn ResultStore invocations into dashboard columns", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .resultstore-updater/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync cycle for a test group
    Sync {
        /// Test group name from the configuration
        #[arg(short, long)]
        group: String,

        /// Prior columns (JSON array or JSON lines) used as the resume point
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Write emitted columns here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Resume no earlier than this RFC 3339 time when there is no state
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },

    /// Search for invocations started since a time
    Search {
        /// Lower bound on invocation start, RFC 3339
        #[arg(long)]
        since: DateTime<Utc>,
    },

    /// Print the time the next sync of a group would search from
    ResumePoint {
        /// Test group name from the configuration
        #[arg(short, long)]
        group: String,

        /// Prior columns (JSON array or JSON lines)
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync() {
        let cli = Cli::parse_from([
            "resultstore-updater",
            "--json",
            "sync",
            "--group",
            "ci-unit",
            "--state",
            "columns.json",
            "--since",
            "2024-01-02T03:04:05Z",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Sync {
                group,
                state,
                out,
                since,
            } => {
                assert_eq!(group, "ci-unit");
                assert_eq!(state, Some(PathBuf::from("columns.json")));
                assert!(out.is_none());
                assert_eq!(since.map(|t| t.timestamp()), Some(1_704_164_645));
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_time() {
        let result = Cli::try_parse_from([
            "resultstore-updater",
            "search",
            "--since",
            "yesterday",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "resultstore-updater",
            "resume-point",
            "-g",
            "g",
            "--config",
            "custom.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::ResumePoint { .. }));
    }
}
