//! The log record handed to every handler.
use chrono::NaiveDateTime;

use super::level::Severity;
use super::utils::now_local;

/// One emitted log event, after level filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Local wall-clock time the record was created.
    pub timestamp: NaiveDateTime,
    /// Severity the record was emitted at.
    pub severity: Severity,
    /// Dotted name of the emitting logger (`"root"` for the root logger).
    pub logger: String,
    /// The formatted message.
    pub message: String,
    /// Source file of the call site, when known.
    pub file: Option<String>,
    /// Source line of the call site, when known.
    pub line: Option<u32>,
    /// Enclosing module or function of the call site, when known.
    pub func: Option<String>,
    /// Rendered error chain attached by `exception`/`uncaught`.
    pub exception: Option<String>,
}

impl Record {
    /// A record stamped with the current time and no source location.
    #[must_use]
    pub fn new(severity: Severity, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_local(),
            severity,
            logger: logger.into(),
            message: message.into(),
            file: None,
            line: None,
            func: None,
            exception: None,
        }
    }
}
