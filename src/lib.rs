//! ResultStore Updater - dashboard columns from ResultStore invocations
//!
//! Searches a ResultStore project for invocations started since the last
//! cycle, exports them, and turns each group of invocations into one
//! dashboard column of per-target and per-test-method cells.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the ResultStore port
//! - **Service Layer** (`services`): Pure column-building logic
//! - **Application Layer** (`application`): The sync cycle
//! - **Infrastructure Layer** (`infrastructure`): HTTP client, config, logging, state files
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use resultstore_updater::application::{build_columns, ColumnReader};
//!
//! let columns = build_columns(&group, &bundles);
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{ColumnReader, CycleReport, ReaderOptions};
pub use domain::errors::{SyncError, SyncResult};
pub use domain::models::{Column, Config, LoggingConfig, TestGroupConfig};
pub use domain::ports::{ResultStoreClient, ResultStoreError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
