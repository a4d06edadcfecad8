//! Archive loading and bounded entry reads.
//!
//! Opens a ZIP archive from memory or disk, skips directories and
//! zero-length entries, and reads every remaining entry in fixed-size
//! chunks up to a per-entry byte cap.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};

use zip::ZipArchive;

use crate::config::ReadLimits;
use crate::error::{LogsError, Result};
use crate::models::{ArchiveSource, LogFile};
use crate::timestamp;

/// Open an archive and extract every qualifying entry.
///
/// Fails only when the container itself cannot be opened. Entries that
/// cannot be opened or read are logged and skipped.
pub fn load_archive(source: ArchiveSource<'_>, limits: &ReadLimits) -> Result<Vec<LogFile>> {
    match source {
        ArchiveSource::Bytes(bytes) => {
            let size = bytes.len() as u64;
            extract_entries(Cursor::new(bytes), &source.describe(), size, limits)
        }
        ArchiveSource::Path(path) => {
            let file = File::open(path).map_err(|e| LogsError::io(path, e))?;
            let size = file
                .metadata()
                .map_err(|e| LogsError::io(path, e))?
                .len();
            extract_entries(file, &source.describe(), size, limits)
        }
    }
}

fn extract_entries<R: Read + Seek>(
    reader: R,
    source_name: &str,
    size: u64,
    limits: &ReadLimits,
) -> Result<Vec<LogFile>> {
    let mut archive = ZipArchive::new(reader).map_err(|source| LogsError::ArchiveFormat {
        source_name: source_name.to_string(),
        size,
        source,
    })?;

    tracing::info!(
        archive = source_name,
        bytes = size,
        entries = archive.len(),
        "Opened log archive"
    );

    let mut files = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index = i, error = %e, "Skipping unreadable archive entry");
                continue;
            }
        };

        if entry.is_dir() || entry.size() == 0 {
            continue;
        }

        let name = entry.name().to_string();
        let (content, truncated) = match read_capped(&mut entry, &name, limits) {
            Ok(read) => read,
            Err(e) => {
                tracing::warn!(entry = %name, error = %e, "Skipping archive entry after read failure");
                continue;
            }
        };

        let timestamp = timestamp::latest_timestamp(&content);
        if timestamp.is_none() {
            tracing::debug!(entry = %name, "No parseable timestamp, treating as oldest");
        }

        files.push(LogFile {
            name,
            timestamp,
            content,
            truncated,
        });
    }

    Ok(files)
}

/// Read `reader` to the end in `limits.chunk_size` pieces, stopping at
/// `limits.max_file_bytes`.
///
/// Returns the bytes read and whether anything was left unread.
pub fn read_capped<R: Read>(
    reader: &mut R,
    name: &str,
    limits: &ReadLimits,
) -> io::Result<(Vec<u8>, bool)> {
    let cap = limits.max_file_bytes;
    let mut buf = vec![0u8; limits.chunk_size.max(1)];
    let mut content = Vec::new();
    let mut remaining = cap;

    while remaining > 0 {
        let want = buf.len().min(remaining.min(usize::MAX as u64) as usize);
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => return Ok((content, false)),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        content.extend_from_slice(&buf[..n]);
        remaining -= n as u64;
    }

    // Budget spent; one extra byte tells a file of exactly `cap` bytes
    // apart from an oversized one.
    let mut lookahead = [0u8; 1];
    let truncated = loop {
        match reader.read(&mut lookahead) {
            Ok(n) => break n > 0,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    };

    if truncated {
        tracing::warn!(
            entry = name,
            cap,
            "Log file exceeds byte cap, keeping the first {} bytes",
            cap
        );
    }

    Ok((content, truncated))
}
