use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::ResultStoreClient;
use crate::infrastructure::resultstore::HttpResultStoreClient;

/// Invocations matching a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    /// Search filter sent to ResultStore
    pub query: String,
    /// Matching invocation IDs in answer order
    pub invocation_ids: Vec<String>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Query: {}", self.query)];
        lines.extend(self.invocation_ids.iter().map(|id| format!("  {id}")));
        lines.push(format!("{} invocation(s)", self.invocation_ids.len()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Handle the search command
pub async fn execute(config: &Config, since: DateTime<Utc>, json: bool) -> Result<()> {
    let client = HttpResultStoreClient::with_config(&config.result_store)
        .context("Failed to create ResultStore client")?;
    let result = run(&client, config, since, &CancellationToken::new()).await?;
    output(&result, json);
    Ok(())
}

/// Search `client` from `since` with the configured project and query.
pub async fn run(
    client: &dyn ResultStoreClient,
    config: &Config,
    since: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<SearchOutput> {
    let (query, invocation_ids) = application::search(
        Some(client),
        &config.result_store.project,
        &config.result_store.query,
        since,
        cancel,
    )
    .await
    .context("Invocation search failed")?;
    Ok(SearchOutput {
        query,
        invocation_ids,
    })
}
