//! Infrastructure layer module
//!
//! This module contains the adapters around the sync core:
//! - ResultStore clients (REST and in-memory)
//! - Configuration management
//! - Logging infrastructure
//! - Column state files
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod resultstore;
pub mod state;
