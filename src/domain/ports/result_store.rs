use async_trait::async_trait;

use crate::domain::models::InvocationBundle;

/// Error types specific to ResultStore operations
#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("ResultStore returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ResultStoreError {
    /// Whether retrying the same request may succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            Self::Transport(_) => true,
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// Port trait for the remote result store
///
/// The sync cycle only needs two capabilities: find invocation ids matching
/// a query, and export everything recorded under one invocation.
/// Implementations own transport, authentication, pagination and retries;
/// cancellation is applied by the caller racing each returned future.
#[async_trait]
pub trait ResultStoreClient: Send + Sync {
    /// Search invocations
    ///
    /// # Arguments
    /// * `query` - ResultStore search query text
    /// * `project` - Project the invocations are recorded under
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Matching invocation ids in the order returned
    /// * `Err(ResultStoreError)` - The query could not be answered
    async fn search_invocations(
        &self,
        query: &str,
        project: &str,
    ) -> Result<Vec<String>, ResultStoreError>;

    /// Export one invocation with its targets, configured targets and actions
    async fn export_invocation(
        &self,
        invocation_id: &str,
    ) -> Result<InvocationBundle, ResultStoreError>;
}
