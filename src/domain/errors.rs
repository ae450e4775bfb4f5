//! Domain errors for a sync cycle.

use thiserror::Error;

use super::ports::ResultStoreError;

/// Errors that abort a sync cycle.
///
/// None of these leave partial output behind: a failed cycle emits no
/// columns, so the previous cycle's columns remain the resume state.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search failed for query {query:?}: {source}")]
    Search {
        query: String,
        #[source]
        source: ResultStoreError,
    },

    #[error("No invocations found for query {0:?}")]
    NoResults(String),

    #[error("Sync cycle cancelled")]
    Cancelled,

    #[error("Column receiver closed before the cycle finished")]
    OutputClosed,
}

pub type SyncResult<T> = Result<T, SyncError>;
