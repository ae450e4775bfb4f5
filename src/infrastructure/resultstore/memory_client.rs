//! In-memory ResultStore for tests and dry runs

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::InvocationBundle;
use crate::domain::ports::{ResultStoreClient, ResultStoreError};

/// In-memory client keyed by exact query text and invocation id
///
/// Unknown queries answer the fallback ids when set and `NotFound`
/// otherwise. Individual exports can be made to fail to exercise partial
/// fetches. Every query received is recorded.
#[derive(Clone, Default)]
pub struct InMemoryResultStoreClient {
    searches: Arc<RwLock<HashMap<String, Vec<String>>>>,
    fallback: Arc<RwLock<Option<Vec<String>>>>,
    queries: Arc<RwLock<Vec<String>>>,
    invocations: Arc<RwLock<HashMap<String, InvocationBundle>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    export_delay: Option<Duration>,
    export_calls: Arc<AtomicUsize>,
}

impl InMemoryResultStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `ids`.
    #[must_use]
    pub fn with_search(self, query: impl Into<String>, ids: Vec<String>) -> Self {
        if let Ok(mut searches) = self.searches.write() {
            searches.insert(query.into(), ids);
        }
        self
    }

    /// Answer every unregistered query with `ids`.
    #[must_use]
    pub fn with_any_search(self, ids: Vec<String>) -> Self {
        if let Ok(mut fallback) = self.fallback.write() {
            *fallback = Some(ids);
        }
        self
    }

    /// Serve `bundle` under its own invocation id.
    #[must_use]
    pub fn with_invocation(self, bundle: InvocationBundle) -> Self {
        if let Ok(mut invocations) = self.invocations.write() {
            invocations.insert(bundle.invocation.invocation_id().to_string(), bundle);
        }
        self
    }

    /// Fail every export of `invocation_id` with a transport error.
    #[must_use]
    pub fn with_failing_export(self, invocation_id: impl Into<String>) -> Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(invocation_id.into());
        }
        self
    }

    /// Sleep for `delay` before answering each export.
    #[must_use]
    pub fn with_export_delay(mut self, delay: Duration) -> Self {
        self.export_delay = Some(delay);
        self
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().map(|q| q.clone()).unwrap_or_default()
    }

    /// Number of export calls served so far.
    pub fn export_calls(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStoreClient for InMemoryResultStoreClient {
    async fn search_invocations(
        &self,
        query: &str,
        _project: &str,
    ) -> Result<Vec<String>, ResultStoreError> {
        self.queries
            .write()
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?
            .push(query.to_string());

        let registered = self
            .searches
            .read()
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?
            .get(query)
            .cloned();
        let fallback = self
            .fallback
            .read()
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?
            .clone();
        registered
            .or(fallback)
            .ok_or_else(|| ResultStoreError::NotFound(format!("no results for query {query:?}")))
    }

    async fn export_invocation(
        &self,
        invocation_id: &str,
    ) -> Result<InvocationBundle, ResultStoreError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.export_delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .read()
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?
            .contains(invocation_id);
        if failing {
            return Err(ResultStoreError::Transport(format!(
                "connection reset while exporting {invocation_id}"
            )));
        }

        self.invocations
            .read()
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?
            .get(invocation_id)
            .cloned()
            .ok_or_else(|| ResultStoreError::NotFound(format!("invocation {invocation_id}")))
    }
}
