//! End-to-end behaviour of the archive -> tail pipeline.

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use harness_logs::archive::load_archive;
use harness_logs::config::{LineLimits, ReadLimits};
use harness_logs::models::ArchiveSource;
use harness_logs::{analyze_archive, LogsError, NO_CONTENT_MESSAGE};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

fn record(time: &str, level: &str, out: &str) -> String {
    serde_json::json!({ "time": time, "level": level, "out": out }).to_string()
}

fn numbered_file(prefix: &str, day: u32, count: usize) -> String {
    (1..=count)
        .map(|i| {
            record(
                &format!("2024-01-{:02}T00:00:{:02}Z", day, i),
                "info",
                &format!("{}{}", prefix, i),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects formatted tracing output for assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn analyze(bytes: &[u8], n: usize) -> String {
    analyze_archive(ArchiveSource::Bytes(bytes), n, &ReadLimits::default()).unwrap()
}

#[test]
fn same_input_same_output() {
    let x = numbered_file("x", 3, 8);
    let y = numbered_file("y", 4, 8);
    let bytes = build_zip(&[
        ("x.log", x.as_str()),
        ("y.log", y.as_str()),
        ("z.log", "raw one\nraw two\n"),
    ]);
    assert_eq!(analyze(&bytes, 12), analyze(&bytes, 12));
}

#[test]
fn output_never_exceeds_clamped_request() {
    let x = numbered_file("x", 3, 40);
    let y = numbered_file("y", 4, 40);
    let bytes = build_zip(&[("x.log", x.as_str()), ("y.log", y.as_str())]);

    for limits in [LineLimits::standard(), LineLimits::internal()] {
        for requested in 1..=150 {
            let n = limits.clamp(Some(requested));
            let out = analyze(&bytes, n);
            let count = out.lines().filter(|l| !l.trim().is_empty()).count();
            assert!(count <= (requested as usize).min(limits.max));
        }
    }
}

#[test]
fn newest_file_is_consulted_first() {
    let older = numbered_file("old", 1, 5);
    let newer = numbered_file("new", 2, 5);
    let bytes = build_zip(&[("older.log", older.as_str()), ("newer.log", newer.as_str())]);

    let out = analyze(&bytes, 3);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        [
            "[2024-01-02 00:00:03] info: new3",
            "[2024-01-02 00:00:04] info: new4",
            "[2024-01-02 00:00:05] info: new5",
        ]
    );
}

#[test]
fn malformed_line_is_emitted_verbatim() {
    let raw = "panic: \x1b[31mboom\x1b[0m {not json";
    let body = format!(
        "{}\n{}\n",
        record("2024-01-01T00:00:00Z", "info", "before"),
        raw
    );
    let bytes = build_zip(&[("step.log", body.as_str())]);

    let out = analyze(&bytes, 10);
    assert_eq!(out.lines().last(), Some(raw));
}

#[test]
fn ansi_codes_are_stripped_from_structured_output() {
    let body = record("2024-01-01T00:00:00Z", "warn", "\x1b[33;1mwarn\x1b[0m");
    let bytes = build_zip(&[("step.log", body.as_str())]);

    let out = analyze(&bytes, 10);
    assert_eq!(out, "[2024-01-01 00:00:00] warn: warn");
    assert!(!out.contains('\x1b'));
}

#[test]
fn empty_archive_yields_no_content_message() {
    let bytes = build_zip(&[("stage/", ""), ("stage/a.log", ""), ("b.log", "")]);
    assert_eq!(analyze(&bytes, 10), NO_CONTENT_MESSAGE);

    let blank = build_zip(&[("blank.log", "\n\n   \n")]);
    assert_eq!(analyze(&blank, 10), NO_CONTENT_MESSAGE);
}

#[test]
fn invalid_archive_is_fatal() {
    let err = analyze_archive(
        ArchiveSource::Bytes(b"PK but not really"),
        10,
        &ReadLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LogsError::ArchiveFormat { .. }));
    assert!(err.to_string().contains("in-memory buffer"));
}

#[test]
fn oversized_entry_is_truncated_not_failed() {
    let line = record("2024-01-01T00:00:00Z", "info", &"x".repeat(200));
    let limits = ReadLimits::default();
    let repeats = (limits.max_file_bytes as usize / (line.len() + 1)) + 2000;
    let body = vec![line.as_str(); repeats].join("\n");
    assert!(body.len() as u64 > limits.max_file_bytes);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("huge.log", stored).unwrap();
    zip.write_all(body.as_bytes()).unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let files = tracing::subscriber::with_default(subscriber, || {
        load_archive(ArchiveSource::Bytes(&bytes), &limits).unwrap()
    });

    let warnings = logs.text();
    assert!(warnings.contains("WARN"), "{}", warnings);
    assert!(warnings.contains("exceeds byte cap"), "{}", warnings);
    assert!(warnings.contains("huge.log"), "{}", warnings);

    assert_eq!(files.len(), 1);
    assert!(files[0].truncated);
    assert_eq!(files[0].content.len() as u64, limits.max_file_bytes);
    assert!(files[0].timestamp.is_some());

    let out = analyze_archive(ArchiveSource::Bytes(&bytes), 5, &limits).unwrap();
    assert_ne!(out, NO_CONTENT_MESSAGE);
    assert!(out.lines().count() <= 5);
}

#[test]
fn multi_line_output_stays_one_line() {
    let body = format!(
        "{}\n",
        record("2024-01-01T00:00:00Z", "info", "first\nsecond\r\nthird\n")
    );
    let bytes = build_zip(&[("step.log", body.as_str())]);

    let out = analyze(&bytes, 1);
    let lines: Vec<&str> = out.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines, ["[2024-01-01 00:00:00] info: first second third"]);
    assert!(!out.contains('\r'));
}

#[test]
fn logged_offset_survives_to_output() {
    let body = record("2024-03-01T17:30:00+05:00", "warn", "late");
    let bytes = build_zip(&[("step.log", body.as_str())]);

    assert_eq!(analyze(&bytes, 1), "[2024-03-01 17:30:00 +05:00] warn: late");
}

#[test]
fn two_file_archive_end_to_end() {
    let a = format!(
        "a first\na second\n{}\n",
        record("2024-01-01T00:00:00Z", "info", "a third")
    );
    let b = format!(
        "b first\nb second\n{}\n",
        record("2024-01-02T00:00:00Z", "error", "b third")
    );
    let bytes = build_zip(&[("a.log", a.as_str()), ("b.log", b.as_str())]);

    let out = analyze(&bytes, 4);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        [
            "[2024-01-01 00:00:00] info: a third",
            "b first",
            "b second",
            "[2024-01-02 00:00:00] error: b third",
        ]
    );
}

#[test]
fn archive_on_disk_matches_in_memory() {
    let body = numbered_file("s", 5, 4);
    let bytes = build_zip(&[("step.log", body.as_str())]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.zip");
    std::fs::write(&path, &bytes).unwrap();

    let from_disk = analyze_archive(ArchiveSource::Path(&path), 10, &ReadLimits::default()).unwrap();
    assert_eq!(from_disk, analyze(&bytes, 10));
}
