//! Rendering merged log lines for display.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::LogRecord;
use crate::timestamp;

/// CSI sequences: `ESC [`, parameter bytes, intermediates, final letter.
static ANSI_CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[A-Za-z]").expect("valid regex"));

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Remove ANSI colour/cursor sequences and any stray ESC bytes.
pub fn strip_ansi(text: &str) -> String {
    ANSI_CSI.replace_all(text, "").replace('\x1b', "")
}

/// Outcome of trying to read a line as a structured record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Structured(LogRecord),
    Raw(String),
}

impl ParsedLine {
    pub fn parse(line: &str) -> Self {
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => ParsedLine::Structured(record),
            Err(_) => ParsedLine::Raw(line.to_string()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            ParsedLine::Structured(record) => format_record(record),
            ParsedLine::Raw(line) => line.clone(),
        }
    }
}

/// `[<time>] <level>: <out>` with ANSI codes removed from `out`.
///
/// The time stays in the offset it was logged with; non-UTC offsets are
/// appended as `+hh:mm`. A multi-line `out` is folded onto one line so each
/// record renders as exactly one line.
pub fn format_record(record: &LogRecord) -> String {
    let time = timestamp::parse_timestamp_with_offset(&record.time)
        .map(|t| {
            if t.offset().local_minus_utc() == 0 {
                t.format(DISPLAY_TIME_FORMAT).to_string()
            } else {
                format!("{} {}", t.format(DISPLAY_TIME_FORMAT), t.format("%:z"))
            }
        })
        .unwrap_or_else(|| single_line(&record.time));
    let out = single_line(&strip_ansi(&record.out));
    format!("[{}] {}: {}", time, single_line(&record.level), out)
}

/// Join the non-blank lines of `text` with single spaces.
fn single_line(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render every line and join them with newlines.
pub fn format_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| ParsedLine::parse(line.as_ref()).render())
        .collect::<Vec<_>>()
        .join("\n")
}
