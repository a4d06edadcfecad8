use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the log download and analysis pipeline.
///
/// Only failures that abort an invocation live here. Skipped entries,
/// unparseable timestamps and unstructured lines are logged and absorbed.
#[derive(Debug, Error)]
pub enum LogsError {
    /// The archive could not be opened as a ZIP container.
    #[error("invalid log archive {source_name} ({size} bytes): {source}")]
    ArchiveFormat {
        source_name: String,
        size: u64,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("execution lookup failed: {0}")]
    ExecutionLookup(String),

    #[error("log analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl LogsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogsError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogsError>;
