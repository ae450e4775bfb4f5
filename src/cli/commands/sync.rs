use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::{ColumnReader, CycleReport};
use crate::cli::output::{output, output_stderr, summary_table, CommandOutput};
use crate::domain::models::{Column, Config, TestGroupConfig};
use crate::infrastructure::resultstore::HttpResultStoreClient;
use crate::infrastructure::state::{ColumnFile, ColumnWriter};

/// Result of one `sync` run
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Test group name
    pub group: String,
    /// Search filter sent to ResultStore
    pub query: String,
    /// Lower bound of the search, when one applied
    pub resume_point: Option<DateTime<Utc>>,
    /// Invocation IDs the search returned
    pub searched: usize,
    /// Invocations exported successfully
    pub fetched: usize,
    /// Columns sent by the reader
    pub emitted: usize,
    /// Columns persisted to the state file
    pub written: usize,
    /// State file the columns were written to
    pub output: String,
}

impl SyncSummary {
    fn new(group: &str, report: CycleReport, written: usize, output: String) -> Self {
        Self {
            group: group.to_string(),
            query: report.query,
            resume_point: report.stop,
            searched: report.searched,
            fetched: report.fetched,
            emitted: report.emitted,
            written,
            output,
        }
    }
}

impl CommandOutput for SyncSummary {
    fn to_human(&self) -> String {
        let resume = self
            .resume_point
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        summary_table([
            ("Group", self.group.clone()),
            ("Resume point", resume),
            ("Query", self.query.clone()),
            ("Invocations found", self.searched.to_string()),
            ("Invocations fetched", self.fetched.to_string()),
            ("Columns emitted", self.emitted.to_string()),
            ("Columns written", self.written.to_string()),
            ("Output", self.output.clone()),
        ])
        .to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Handle the sync command
pub async fn execute(
    config: &Config,
    group: &str,
    state: Option<PathBuf>,
    out: Option<PathBuf>,
    since: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let group = super::find_group(config, group)?;
    let old_columns = match &state {
        Some(path) => ColumnFile::load(path)?,
        None => Vec::new(),
    };

    let client = HttpResultStoreClient::with_config(&config.result_store)
        .context("Failed to create ResultStore client")?;
    let reader = ColumnReader::new(Arc::new(client), super::reader_options(config));
    let writer = ColumnWriter::create(out.as_deref())?;
    let to_stdout = writer.is_stdout();

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling sync");
            signal_token.cancel();
        }
    });

    let summary = run(
        &reader,
        group,
        &old_columns,
        since,
        writer,
        config.sync.channel_capacity,
        &cancel,
    )
    .await?;

    if to_stdout {
        output_stderr(&summary, json);
    } else {
        output(&summary, json);
    }
    Ok(())
}

/// Run one cycle and drain its columns into `writer`.
///
/// Columns are written as they arrive on the channel; the writer is
/// flushed once the cycle ends.
pub async fn run(
    reader: &ColumnReader,
    group: &TestGroupConfig,
    old_columns: &[Column],
    since: Option<DateTime<Utc>>,
    mut writer: ColumnWriter,
    capacity: usize,
    cancel: &CancellationToken,
) -> Result<SyncSummary> {
    let destination = if writer.is_stdout() {
        "stdout".to_string()
    } else {
        "file".to_string()
    };

    let (tx, mut rx) = mpsc::channel::<Column>(capacity.max(1));
    let drain = tokio::spawn(async move {
        while let Some(column) = rx.recv().await {
            writer.write(&column)?;
        }
        writer.finish()
    });

    let report = reader.read(group, old_columns, since, &tx, cancel).await;
    drop(tx);

    let written = drain.await.context("Column writer task failed")??;
    let report = report.with_context(|| format!("Sync of test group {:?} failed", group.name))?;

    info!(group = %group.name, written, "Columns written");
    Ok(SyncSummary::new(&group.name, report, written, destination))
}
