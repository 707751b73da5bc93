//! Structured error types shared across SCB crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`BenchError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, line numbers, coordinates).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the benchmarking harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BenchError {
    /// Invalid sweep or queue configuration, raised before any I/O.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// A user supplied hook or model operation failed.
    #[error("hook error: {0}")]
    Hook(ErrorInfo),
    /// Per-point files could not be assembled into a consistent result.
    #[error("aggregation error: {0}")]
    Aggregate(ErrorInfo),
    /// The external queue command could not be invoked or rejected a job.
    #[error("submission error: {0}")]
    Submit(ErrorInfo),
    /// A result or per-point file did not match the expected format.
    #[error("malformed input: {0}")]
    Parse(ErrorInfo),
    /// Filesystem failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Chart data that cannot be rendered.
    #[error("plot error: {0}")]
    Plot(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl BenchError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BenchError::Config(info)
            | BenchError::Hook(info)
            | BenchError::Aggregate(info)
            | BenchError::Submit(info)
            | BenchError::Parse(info)
            | BenchError::Io(info)
            | BenchError::Serde(info)
            | BenchError::Plot(info) => info,
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        BenchError::Config(ErrorInfo::new(code, message))
    }
}

/// Wraps a filesystem failure, recording the offending path.
pub fn io_error(code: &str, path: &Path, err: impl ToString) -> BenchError {
    BenchError::Io(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Builds a malformed-input error pointing at a file and, when known, a line.
pub fn parse_error(
    code: &str,
    path: &Path,
    line: Option<u64>,
    message: impl Into<String>,
) -> BenchError {
    let mut info = ErrorInfo::new(code, message).with_context("path", path.display().to_string());
    if let Some(line) = line {
        info = info.with_context("line", line.to_string());
    }
    BenchError::Parse(info)
}
