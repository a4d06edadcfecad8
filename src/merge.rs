//! Recency ordering and cross-file tail merge.

use crate::models::LogFile;

/// Sort files newest first. Files without a timestamp go last.
pub fn sort_by_recency(files: &mut [LogFile]) {
    // `None < Some(_)`, so a descending sort leaves unparsed files at the end.
    files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Collect up to `limit` non-empty lines from the tails of `files`.
///
/// Files are consulted in the order given, which should be newest first.
/// Each taken line is placed in front of those already collected, so the
/// result reads oldest to newest both within a file and across files.
pub fn merge_tail_lines(files: &[LogFile], limit: usize) -> Vec<String> {
    let mut collected: Vec<String> = Vec::with_capacity(limit);

    for file in files {
        if collected.len() >= limit {
            break;
        }

        let text = String::from_utf8_lossy(&file.content);
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let needed = limit - collected.len();
        let window: Vec<String> = lines
            .iter()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .take(needed)
            .map(|line| line.to_string())
            .collect();

        tracing::debug!(entry = %file.name, taken = window.len(), "Merged lines from log file");

        // `window` is newest first; prepending one at a time restores file order.
        for line in window {
            collected.insert(0, line);
        }
    }

    collected
}
