//! Timestamp extraction for recency ordering.
//!
//! The trailing line of a log stream is often cut mid-write, so the
//! `"time"` field is located by substring search rather than by parsing
//! the whole line as JSON.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

const TIME_FIELD: &str = "\"time\":\"";

/// Layouts tried in order; the first one that parses wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    /// RFC 3339 with optional fractional seconds and any offset
    Rfc3339,
    /// `2006-01-02T15:04:05.000000000Z`
    NanosZulu,
    /// `2006-01-02T15:04:05Z`
    SecondsZulu,
    /// `2006-01-02T15:04:05.000Z`
    MillisZulu,
}

pub const LAYOUTS: [TimestampLayout; 4] = [
    TimestampLayout::Rfc3339,
    TimestampLayout::NanosZulu,
    TimestampLayout::SecondsZulu,
    TimestampLayout::MillisZulu,
];

impl TimestampLayout {
    pub fn parse(self, value: &str) -> Option<DateTime<Utc>> {
        self.parse_with_offset(value)
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Like `parse`, but keeps the offset written in the log.
    pub fn parse_with_offset(self, value: &str) -> Option<DateTime<FixedOffset>> {
        let naive_format = match self {
            TimestampLayout::Rfc3339 => return DateTime::parse_from_rfc3339(value).ok(),
            TimestampLayout::NanosZulu => "%Y-%m-%dT%H:%M:%S%.9fZ",
            TimestampLayout::SecondsZulu => "%Y-%m-%dT%H:%M:%SZ",
            TimestampLayout::MillisZulu => "%Y-%m-%dT%H:%M:%S%.3fZ",
        };
        NaiveDateTime::parse_from_str(value, naive_format)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    }
}

/// Parse `value` against every known layout.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    LAYOUTS.iter().find_map(|layout| layout.parse(value))
}

/// Parse `value` against every known layout, preserving its offset.
pub fn parse_timestamp_with_offset(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse_with_offset(value))
}

/// Pull the quoted value following `"time":"` out of a raw line.
pub fn time_field(line: &str) -> Option<&str> {
    let start = line.find(TIME_FIELD)? + TIME_FIELD.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// The most recent parseable timestamp in `content`, scanning from the end.
///
/// Blank lines and lines without a usable `time` field are passed over, so
/// a truncated final record falls back to the one before it.
pub fn latest_timestamp(content: &[u8]) -> Option<DateTime<Utc>> {
    let text = String::from_utf8_lossy(content);
    text.lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| time_field(line).and_then(parse_timestamp))
}
