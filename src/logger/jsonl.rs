//! JSONL event log: append-only line-delimited JSON describing a run.
//!
//! Each line is a self-contained JSON object assembled in memory and written
//! with a single `write_all`, so a tailing reader never sees a partial line.
//!
//! Degradation chain:
//! 1. Configured file path
//! 2. stderr with `[IOC-JSONL]` prefix
//! 3. Silent discard (a logging failure never fails a run)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{IocError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Events emitted over the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    SuiteStart,
    CaseComplete,
    IntegrityViolation,
    SuiteComplete,
    RunComplete,
    Error,
}

/// A single JSONL log entry. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Suite label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    /// Case name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    /// Final verdict of a case or suite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    /// Run seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Process exit code of the harness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// SHA-256 of the input fixture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
    /// IOC error code when the event reports a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            suite: None,
            case: None,
            passed: None,
            seed: None,
            exit_code: None,
            input_sha256: None,
            error_code: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Size at which the file is rotated to `<path>.1`. Default: 10 MiB.
    pub max_size_bytes: u64,
    /// Rotated files kept. Default: 3.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Append-only JSONL writer with rotation and stderr fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, falling back to stderr on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[IOC-JSONL] {e}; logging to stderr");
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    /// Write a single log entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[IOC-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let ok = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if ok {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[IOC-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => WriterState::Stderr,
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = self.config.path.clone();
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        let _ = rename(&base, rotated_name(&base, 1));

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Optional event log handed through the run.
pub struct EventLog {
    writer: Option<JsonlWriter>,
}

impl EventLog {
    /// A log that drops every entry.
    pub const fn disabled() -> Self {
        Self { writer: None }
    }

    /// Log to `path`, or disabled when `None`.
    pub fn from_path(path: Option<&Path>) -> Self {
        Self {
            writer: path.map(|p| JsonlWriter::open(JsonlConfig::new(p))),
        }
    }

    pub fn record(&mut self, entry: &LogEntry) {
        if let Some(w) = self.writer.as_mut() {
            w.write_entry(entry);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            w.flush();
        }
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IocError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| IocError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `run.jsonl` → `run.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
