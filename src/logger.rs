//! Best-effort diagnostic logging
//!
//! Failures of the refresh cycle are appended to a plain-text sink so an
//! operator can inspect them after the fact. Logging itself must never fail
//! a run: write errors are swallowed (and traced), never propagated.

use chrono::Utc;
use chrono_tz::Tz;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::constants::{DATE_FORMAT, LOG_SEPARATOR, REFERENCE_TZ};

/// A typed extra value attached to a log entry
///
/// Rendered as `type: \t value`; booleans and absent values are coerced to
/// 0/1-style integers while keeping their original type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl LogValue {
    /// Runtime type tag written before the value
    pub fn type_tag(&self) -> &'static str {
        match self {
            LogValue::Int(_) => "integer",
            LogValue::Float(_) => "double",
            LogValue::Str(_) => "string",
            LogValue::Bool(_) => "boolean",
            LogValue::Null => "NULL",
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Int(value) => write!(f, "{value}"),
            LogValue::Float(value) => write!(f, "{value}"),
            LogValue::Str(value) => write!(f, "{value}"),
            LogValue::Bool(value) => write!(f, "{}", *value as i64),
            LogValue::Null => write!(f, "0"),
        }
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Int(value)
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Float(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Str(value)
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

/// Append-only sink for refresh failures
pub trait DiagnosticLogger: Send + Sync {
    /// Appends one entry; must not panic or propagate sink errors
    fn log(&self, message: &str, values: &[LogValue]);
}

/// File-backed logger writing the separator/timestamp/message/values format
pub struct FileLogger {
    path: PathBuf,
    tz: Tz,
}

impl FileLogger {
    /// Creates a logger appending to the given path, timestamping in the
    /// reference timezone
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_timezone(path, REFERENCE_TZ)
    }

    /// Creates a logger with an explicit timestamp timezone
    pub fn with_timezone(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
        }
    }

    fn append(&self, message: &str, values: &[LogValue]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{LOG_SEPARATOR}")?;
        writeln!(file, "{}", Utc::now().with_timezone(&self.tz).format(DATE_FORMAT))?;
        writeln!(file, "{message}")?;
        for value in values {
            writeln!(file, "{}: \t {}", value.type_tag(), value)?;
        }
        writeln!(file)
    }
}

impl DiagnosticLogger for FileLogger {
    fn log(&self, message: &str, values: &[LogValue]) {
        if let Err(e) = self.append(message, values) {
            tracing::warn!(error = %e, path = %self.path.display(), "diagnostic log write failed");
        }
    }
}

/// Logger that keeps entries in memory, for tests and embedding
#[derive(Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

/// One captured log entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub values: Vec<LogValue>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries captured so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl DiagnosticLogger for MemoryLogger {
    fn log(&self, message: &str, values: &[LogValue]) {
        self.entries.lock().unwrap().push(LogEntry {
            message: message.to_string(),
            values: values.to_vec(),
        });
    }
}

/// Logger that discards everything
pub struct NullLogger;

impl DiagnosticLogger for NullLogger {
    fn log(&self, _message: &str, _values: &[LogValue]) {}
}
