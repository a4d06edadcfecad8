//! Execution log download and tail analysis for a Harness MCP server.
//!
//! A log archive (ZIP of per-step log files) is loaded, each file is dated
//! by its most recent record, and the newest lines across files are merged
//! into a short human-readable tail.

pub mod analyzer;
pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod log_service;
pub mod mcp;
pub mod merge;
pub mod models;
pub mod timestamp;

pub use analyzer::{analyze_archive, analyze_archive_file, NO_CONTENT_MESSAGE};
pub use error::{LogsError, Result};
