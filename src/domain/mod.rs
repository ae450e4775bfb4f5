//! Domain layer for the ResultStore updater
//!
//! This module contains the record types, column model, configuration
//! model, port traits and error types shared by every other layer.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{SyncError, SyncResult};
