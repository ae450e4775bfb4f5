//! ResultStore v2 REST client.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::future::retry_notify;
use backoff::{Error as BackoffError, ExponentialBackoff, ExponentialBackoffBuilder};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::models::invocation::InvocationId;
use crate::domain::models::{
    Action, ConfiguredTarget, Invocation, InvocationBundle, ResultStoreConfig, Target,
};
use crate::domain::ports::{ResultStoreClient, ResultStoreError};

/// Field mask for search responses; only ids are needed.
const SEARCH_FIELD_MASK: &str = "invocations.id,nextPageToken";

/// Field mask for export responses.
const EXPORT_FIELD_MASK: &str = "*";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchInvocationsResponse {
    invocations: Vec<SearchedInvocation>,
    next_page_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchedInvocation {
    id: InvocationId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExportInvocationResponse {
    invocation: Option<Invocation>,
    targets: Vec<Target>,
    configured_targets: Vec<ConfiguredTarget>,
    actions: Vec<Action>,
    next_page_token: String,
}

/// HTTP client for the ResultStore REST API
///
/// Provides:
/// - Bearer token authentication (token read from the configured env var)
/// - Page-token pagination for search and export
/// - Client-side rate limiting (requests per second)
/// - Exponential backoff retries of transient failures (429, 5xx, transport)
pub struct HttpResultStoreClient {
    http_client: ReqwestClient,
    base_url: String,
    token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    initial_backoff: Duration,
    max_backoff: Duration,
    max_elapsed: Duration,
}

impl HttpResultStoreClient {
    /// Build a client from configuration.
    ///
    /// The bearer token is taken from the environment variable named by
    /// `token_env`; requests go out unauthenticated when it is unset.
    pub fn with_config(config: &ResultStoreConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            debug!(token_env = %config.token_env, "No ResultStore token set, sending unauthenticated requests");
        }
        Self::build(config, token)
    }

    /// Build a client with an explicit token.
    pub fn with_token(config: &ResultStoreConfig, token: Option<String>) -> Result<Self> {
        Self::build(config, token)
    }

    fn build(config: &ResultStoreConfig, token: Option<String>) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        let rate = NonZeroU32::new(config.requests_per_second)
            .context("requests_per_second must be greater than 0")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            max_elapsed: Duration::from_millis(config.max_elapsed_ms),
        })
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.2)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    /// GET `url` and decode JSON, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        field_mask: &str,
    ) -> Result<T, ResultStoreError> {
        retry_notify(
            self.backoff(),
            move || async move {
                self.rate_limiter.until_ready().await;
                self.send_once(url, params, field_mask).await.map_err(|err| {
                    if err.is_transient() {
                        BackoffError::transient(err)
                    } else {
                        BackoffError::permanent(err)
                    }
                })
            },
            |err: ResultStoreError, wait: Duration| {
                warn!(url = %url, error = %err, retry_in_ms = wait.as_millis(), "Transient ResultStore error, retrying");
            },
        )
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        field_mask: &str,
    ) -> Result<T, ResultStoreError> {
        let mut request = self.http_client.get(url).header("X-Goog-FieldMask", field_mask);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResultStoreError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(ResultStoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResultStoreError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ResultStoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResultStoreClient for HttpResultStoreClient {
    #[instrument(skip(self), fields(project = %project))]
    async fn search_invocations(
        &self,
        query: &str,
        project: &str,
    ) -> Result<Vec<String>, ResultStoreError> {
        let url = format!("{}/v2/invocations:search", self.base_url);
        let mut ids = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut params = vec![("query", query), ("projectId", project)];
            if !page_token.is_empty() {
                params.push(("pageToken", page_token.as_str()));
            }
            let page: SearchInvocationsResponse =
                self.get_json(&url, &params, SEARCH_FIELD_MASK).await?;

            ids.extend(page.invocations.into_iter().map(|inv| inv.id.invocation_id));
            if page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        debug!(count = ids.len(), "Search complete");
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn export_invocation(
        &self,
        invocation_id: &str,
    ) -> Result<InvocationBundle, ResultStoreError> {
        let url = format!("{}/v2/invocations/{invocation_id}:export", self.base_url);
        let mut bundle: Option<InvocationBundle> = None;
        let mut page_token = String::new();

        loop {
            let params: Vec<(&str, &str)> = if page_token.is_empty() {
                Vec::new()
            } else {
                vec![("pageToken", page_token.as_str())]
            };
            let page: ExportInvocationResponse =
                self.get_json(&url, &params, EXPORT_FIELD_MASK).await?;

            let merged = bundle.get_or_insert_with(InvocationBundle::default);
            if let Some(invocation) = page.invocation {
                if merged.invocation.invocation_id().is_empty() {
                    merged.invocation = invocation;
                }
            }
            merged.targets.extend(page.targets);
            merged.configured_targets.extend(page.configured_targets);
            merged.actions.extend(page.actions);

            if page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        let bundle = bundle.unwrap_or_default();
        if bundle.invocation.invocation_id().is_empty() {
            return Err(ResultStoreError::Decode(format!(
                "export of {invocation_id} carried no invocation record"
            )));
        }
        Ok(bundle)
    }
}
