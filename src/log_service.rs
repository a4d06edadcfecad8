//! Client for the pieces of the Harness API the log download needs:
//! execution lookup, the log service's blob download link, and the
//! archive fetch itself.

use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::Config;
use crate::error::{LogsError, Result};
use crate::models::{DownloadLinkResponse, ExecutionSummary, Scope};

const EXECUTION_PATH: &str = "pipeline/api/pipelines/execution/v2";
const LOG_DOWNLOAD_PATH: &str = "gateway/log-service/blob/download";
const API_KEY_HEADER: &str = "x-api-key";
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct LogServiceClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl LogServiceClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("harness-logs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Look up the pipeline identifier and run sequence of an execution.
    pub async fn execution_summary(
        &self,
        scope: &Scope,
        plan_execution_id: &str,
    ) -> Result<ExecutionSummary> {
        let url = self.url(&format!("{}/{}", EXECUTION_PATH, plan_execution_id));
        let mut query = vec![("accountIdentifier", scope.account_id.as_str())];
        if let Some(ref org) = scope.org_id {
            query.push(("orgIdentifier", org.as_str()));
        }
        if let Some(ref project) = scope.project_id {
            query.push(("projectIdentifier", project.as_str()));
        }

        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&query)
            .send()
            .await?;
        let body: Value = check_status(resp).await?.json().await?;

        let summary = body
            .pointer("/data/pipelineExecutionSummary")
            .cloned()
            .ok_or_else(|| {
                LogsError::ExecutionLookup(format!(
                    "no pipelineExecutionSummary for execution {}",
                    plan_execution_id
                ))
            })?;

        serde_json::from_value(summary).map_err(|e| {
            LogsError::ExecutionLookup(format!(
                "malformed execution summary for {}: {}",
                plan_execution_id, e
            ))
        })
    }

    /// Build the log key prefix under which an execution's logs are stored.
    pub async fn execution_log_prefix(
        &self,
        scope: &Scope,
        plan_execution_id: &str,
    ) -> Result<String> {
        let summary = self.execution_summary(scope, plan_execution_id).await?;
        Ok(log_prefix(&scope.account_id, &summary, plan_execution_id))
    }

    /// Ask the log service for a short-lived download URL for `prefix`.
    pub async fn download_link(&self, account_id: &str, prefix: &str) -> Result<String> {
        let url = self.url(LOG_DOWNLOAD_PATH);
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("accountID", account_id), ("prefix", prefix)])
            .send()
            .await?;
        let link: DownloadLinkResponse = check_status(resp).await?.json().await?;
        if link.link.is_empty() {
            return Err(LogsError::ExecutionLookup(format!(
                "log service returned an empty download link for {}",
                prefix
            )));
        }
        Ok(link.link)
    }

    /// GET the archive behind a download link.
    pub async fn fetch_archive(&self, link: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(link).send().await?;
        let bytes = check_status(resp).await?.bytes().await?;
        tracing::info!(bytes = bytes.len(), "Downloaded log archive");
        Ok(bytes.to_vec())
    }
}

/// `<account>/pipeline/<pipeline>/<run sequence>/-<plan execution id>`
pub fn log_prefix(account_id: &str, summary: &ExecutionSummary, plan_execution_id: &str) -> String {
    format!(
        "{}/pipeline/{}/{}/-{}",
        account_id, summary.pipeline_identifier, summary.run_sequence, plan_execution_id
    )
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    Err(LogsError::HttpStatus { url, status, body })
}
