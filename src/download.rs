use std::path::{Path, PathBuf};

use crate::analyzer;
use crate::config::Config;
use crate::error::{LogsError, Result};
use crate::log_service::LogServiceClient;
use crate::models::{DownloadLogsParams, Scope};

pub const ARCHIVE_FILE_NAME: &str = "logs.zip";

/// What a completed download produced.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub archive_path: PathBuf,
    pub num_lines: usize,
    pub tail: String,
}

impl DownloadOutcome {
    /// Text returned to the tool caller.
    pub fn summary(&self) -> String {
        format!(
            "Logs downloaded to {}\n\nLast {} log lines:\n{}",
            self.archive_path.display(),
            self.num_lines,
            self.tail
        )
    }
}

/// `<dir>/logs-<execution id>/logs.zip`
pub fn archive_path(logs_directory: &Path, plan_execution_id: &str) -> PathBuf {
    logs_directory
        .join(format!("logs-{}", plan_execution_id))
        .join(ARCHIVE_FILE_NAME)
}

/// Write the archive under `logs_directory`, replacing any earlier copy.
pub async fn persist_archive(
    logs_directory: &Path,
    plan_execution_id: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let path = archive_path(logs_directory, plan_execution_id);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LogsError::io(parent, e))?;
    }
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| LogsError::io(&path, e))?;
    Ok(path)
}

/// Resolve the log key, download the archive, save it and analyze it.
pub async fn download_execution_logs(
    client: &LogServiceClient,
    cfg: &Config,
    params: &DownloadLogsParams,
) -> Result<DownloadOutcome> {
    let execution_id = params.plan_execution_id.trim();
    if execution_id.is_empty() {
        return Err(LogsError::InvalidParameter(
            "plan_execution_id must not be empty".into(),
        ));
    }
    if params.logs_directory.trim().is_empty() {
        return Err(LogsError::InvalidParameter(
            "logs_directory must not be empty".into(),
        ));
    }
    if cfg.account_id.is_empty() {
        return Err(LogsError::InvalidParameter(
            "account id is not configured".into(),
        ));
    }

    let scope = Scope {
        account_id: cfg.account_id.clone(),
        org_id: params.org_id.clone().or_else(|| cfg.org_id.clone()),
        project_id: params.project_id.clone().or_else(|| cfg.project_id.clone()),
    };
    let num_lines = cfg.lines.clamp(params.num_lines);

    let prefix = match params.log_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => client.execution_log_prefix(&scope, execution_id).await?,
    };
    tracing::info!(execution_id, prefix = %prefix, "Requesting log download link");

    let link = client.download_link(&scope.account_id, &prefix).await?;
    let bytes = client.fetch_archive(&link).await?;

    let archive_path =
        persist_archive(Path::new(&params.logs_directory), execution_id, &bytes).await?;
    tracing::info!(execution_id, path = %archive_path.display(), "Saved log archive");

    let tail = analyzer::analyze_archive_file(archive_path.clone(), num_lines, cfg.read).await?;

    Ok(DownloadOutcome {
        archive_path,
        num_lines,
        tail,
    })
}
