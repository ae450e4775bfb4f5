use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::models::{Column, InvocationBundle, TestGroupConfig};
use crate::domain::ports::ResultStoreClient;
use crate::services::{column_materializer, grouper, invocation_assembler, resume_point};

/// Tuning for a [`ColumnReader`]
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Project the invocations are recorded under
    pub project: String,
    /// Base search query the resume point is appended to
    pub query: String,
    /// Always search at least this far back
    pub reprocess: Duration,
    /// Exports in flight at once
    pub fetch_concurrency: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            project: String::new(),
            query: resume_point::QUERY_PROW.to_string(),
            reprocess: Duration::zero(),
            fetch_concurrency: 8,
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Lower bound the search started from
    pub stop: Option<DateTime<Utc>>,
    /// Query text sent to the store
    pub query: String,
    /// Invocation ids the search returned
    pub searched: usize,
    /// Exports that succeeded
    pub fetched: usize,
    /// Columns sent downstream
    pub emitted: usize,
}

/// Runs one sync cycle per call to [`ColumnReader::read`]
///
/// A cycle computes the resume point, searches for invocations started
/// since then, exports each one with bounded concurrency, assembles and
/// groups them, and sends the resulting columns newest first.
///
/// Failed exports are logged and skipped. Everything else that goes wrong
/// (configuration, search, cancellation, a closed receiver) fails the
/// cycle; columns are only sent once every fetch has finished, so a cycle
/// that fails before emission leaves nothing behind.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use resultstore_updater::application::{ColumnReader, ReaderOptions};
/// use resultstore_updater::domain::models::TestGroupConfig;
/// use resultstore_updater::infrastructure::resultstore::InMemoryResultStoreClient;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let reader = ColumnReader::new(
///     Arc::new(InMemoryResultStoreClient::new()),
///     ReaderOptions { project: "my-project".to_string(), ..ReaderOptions::default() },
/// );
/// let (tx, mut rx) = mpsc::channel(16);
/// let group = TestGroupConfig::default();
/// reader.read(&group, &[], None, &tx, &CancellationToken::new()).await?;
/// drop(tx);
/// while let Some(column) = rx.recv().await {
///     println!("{}", column.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ColumnReader {
    client: Arc<dyn ResultStoreClient>,
    options: ReaderOptions,
}

impl ColumnReader {
    /// Reader over `client` with fixed per-cycle `options`.
    pub fn new(client: Arc<dyn ResultStoreClient>, options: ReaderOptions) -> Self {
        Self { client, options }
    }

    /// Options every cycle of this reader runs with.
    pub const fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Lower bound the next cycle for `group` would search from.
    pub fn resume_point(
        &self,
        group: &TestGroupConfig,
        now: DateTime<Utc>,
        old_columns: &[Column],
        default_stop: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        resume_point::update_stop(Some(group), now, old_columns, default_stop, self.options.reprocess)
    }

    /// Run one cycle for `group`, sending columns on `tx`.
    #[instrument(skip_all, fields(group = %group.name))]
    pub async fn read(
        &self,
        group: &TestGroupConfig,
        old_columns: &[Column],
        default_stop: Option<DateTime<Utc>>,
        tx: &mpsc::Sender<Column>,
        cancel: &CancellationToken,
    ) -> SyncResult<CycleReport> {
        if self.options.project.is_empty() {
            return Err(SyncError::Config("ResultStore project is not set".to_string()));
        }

        let now = Utc::now();
        let stop = self.resume_point(group, now, old_columns, default_stop);
        if stop > now {
            return Err(SyncError::Config(format!(
                "resume point {stop} is in the future"
            )));
        }
        debug!(stop = %stop, "Computed resume point");

        let (query, ids) = search(
            Some(self.client.as_ref()),
            &self.options.project,
            &self.options.query,
            stop,
            cancel,
        )
        .await?;
        info!(query = %query, count = ids.len(), "Found invocations");

        let searched = ids.len();
        let bundles = self.fetch_all(ids, cancel).await?;
        let fetched = bundles.len();

        let columns = build_columns(group, &bundles);
        let emitted = emit(columns, tx, cancel).await?;
        info!(searched, fetched, emitted, "Sync cycle complete");

        Ok(CycleReport {
            stop: Some(stop),
            query,
            searched,
            fetched,
            emitted,
        })
    }

    /// Export every id, keeping search order. Failed exports are skipped.
    async fn fetch_all(
        &self,
        ids: Vec<String>,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<InvocationBundle>> {
        let concurrency = self.options.fetch_concurrency.max(1);
        let mut exports = std::pin::pin!(stream::iter(ids)
            .map(|id| {
                let client = Arc::clone(&self.client);
                async move {
                    let result = client.export_invocation(&id).await;
                    (id, result)
                }
            })
            .buffered(concurrency));

        let mut bundles = Vec::new();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(fetched = bundles.len(), "Cancelled while fetching invocations");
                    return Err(SyncError::Cancelled);
                }
                next = exports.next() => match next {
                    Some((_, Ok(bundle))) => bundles.push(bundle),
                    Some((id, Err(err))) => {
                        warn!(invocation_id = %id, error = %err, "Failed to export invocation, skipping");
                    }
                    None => break,
                },
            }
        }
        Ok(bundles)
    }
}

/// Run the search for invocations started at or after `stop`.
///
/// Returns the query text sent together with the matching ids. A missing
/// client, a failed call, and an empty answer are all errors.
pub async fn search(
    client: Option<&dyn ResultStoreClient>,
    project: &str,
    base_query: &str,
    stop: DateTime<Utc>,
    cancel: &CancellationToken,
) -> SyncResult<(String, Vec<String>)> {
    let Some(client) = client else {
        return Err(SyncError::Config("no ResultStore client configured".to_string()));
    };

    let query = resume_point::query_after(base_query, stop);
    let ids = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(SyncError::Cancelled),
        result = client.search_invocations(&query, project) => {
            result.map_err(|source| SyncError::Search { query: query.clone(), source })?
        }
    };

    if ids.is_empty() {
        return Err(SyncError::NoResults(query));
    }
    Ok((query, ids))
}

/// Assemble, group and materialize fetched bundles, newest column first.
pub fn build_columns(group: &TestGroupConfig, bundles: &[InvocationBundle]) -> Vec<Column> {
    let assembled = bundles
        .iter()
        .filter_map(|bundle| invocation_assembler::assemble(Some(bundle)))
        .collect();
    let groups = grouper::group_invocations(Some(group), assembled);

    let mut columns: Vec<Column> = groups
        .iter()
        .filter_map(|g| column_materializer::materialize(Some(group), Some(g)))
        .collect();
    columns.sort_by(|a, b| b.started.total_cmp(&a.started));
    columns
}

/// Send `columns` in order, stopping at the first cancellation.
///
/// Nothing is sent once `cancel` has fired. A cancellation that lands between
/// sends leaves the newest-first prefix already delivered on `tx`.
async fn emit(
    columns: Vec<Column>,
    tx: &mpsc::Sender<Column>,
    cancel: &CancellationToken,
) -> SyncResult<usize> {
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    let mut sent = 0;
    for column in columns {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SyncError::Cancelled),
            result = tx.send(column) => {
                result.map_err(|_| SyncError::OutputClosed)?;
                sent += 1;
            }
        }
    }
    Ok(sent)
}
