use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One archive entry after extraction.
#[derive(Debug, Clone)]
pub struct LogFile {
    /// Archive-relative path
    pub name: String,

    /// Most recent embedded log time; `None` sorts as oldest
    pub timestamp: Option<DateTime<Utc>>,

    /// Raw bytes, at most `ReadLimits::max_file_bytes`
    pub content: Vec<u8>,

    /// Set when the entry was cut off at the byte cap
    pub truncated: bool,
}

/// A structured log line as written by the log service.
///
/// Missing fields default to empty strings so any JSON object qualifies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogRecord {
    pub time: String,
    pub level: String,
    pub out: String,
}

/// Where the ZIP archive lives once it has been materialized.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveSource<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
}

impl ArchiveSource<'_> {
    /// Human-readable origin used in error messages.
    pub fn describe(&self) -> String {
        match self {
            ArchiveSource::Bytes(_) => "in-memory buffer".to_string(),
            ArchiveSource::Path(p) => p.display().to_string(),
        }
    }
}

/// Arguments of the `download_execution_logs` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadLogsParams {
    pub plan_execution_id: String,
    pub logs_directory: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_lines: Option<i64>,
    #[serde(default)]
    pub log_key: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Arguments of the `analyze_log_archive` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeArchiveParams {
    pub archive_path: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_lines: Option<i64>,
}

/// Account/org/project triple a request is made under.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
}

/// Response of the log service's blob download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadLinkResponse {
    pub link: String,
}

/// The fields of an execution summary needed to build a log prefix.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub pipeline_identifier: String,
    pub run_sequence: i64,
}

/// Accepts `10`, `10.0` or `"10"`; anything else counts as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
