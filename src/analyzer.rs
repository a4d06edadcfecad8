use std::path::PathBuf;

use crate::archive;
use crate::config::ReadLimits;
use crate::error::Result;
use crate::format;
use crate::merge;
use crate::models::ArchiveSource;

/// Returned when the archive holds no usable log lines.
pub const NO_CONTENT_MESSAGE: &str = "No log content found in the downloaded archive.";

/// Produce the last `num_lines` formatted log lines from a ZIP archive.
///
/// `num_lines` is used as given; callers clamp it with `LineLimits`.
pub fn analyze_archive(
    source: ArchiveSource<'_>,
    num_lines: usize,
    limits: &ReadLimits,
) -> Result<String> {
    let mut files = archive::load_archive(source, limits)?;
    if files.is_empty() {
        tracing::info!(archive = %source.describe(), "Archive contains no log files");
        return Ok(NO_CONTENT_MESSAGE.to_string());
    }

    merge::sort_by_recency(&mut files);
    let lines = merge::merge_tail_lines(&files, num_lines);
    if lines.is_empty() {
        return Ok(NO_CONTENT_MESSAGE.to_string());
    }

    tracing::debug!(
        files = files.len(),
        lines = lines.len(),
        requested = num_lines,
        "Merged log tail"
    );

    Ok(format::format_lines(&lines))
}

/// Run `analyze_archive` on a file from async code.
///
/// Inflating and scanning entries is CPU and disk bound, so the work runs
/// on the blocking pool instead of a runtime worker.
pub async fn analyze_archive_file(
    path: PathBuf,
    num_lines: usize,
    limits: ReadLimits,
) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        analyze_archive(ArchiveSource::Path(&path), num_lines, &limits)
    })
    .await?
}
