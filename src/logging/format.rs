//! Console and file renderings of a [`Record`].
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};

use super::level::Severity;
use super::record::Record;
use super::utils::{format_timestamp, strip_ansi};

/// Process-wide switch for console colors.
static COLOR_ENABLED: AtomicBool = AtomicBool::new(true);

const RESET: &str = "\x1b[0m";
const MESSAGE_COLOR: &str = "\x1b[37m";

/// Enable or disable console colors for every console handler.
pub fn set_color_enabled(enabled: bool) {
    COLOR_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether console colors are currently enabled process-wide.
#[must_use]
pub fn color_enabled() -> bool {
    COLOR_ENABLED.load(Ordering::Relaxed)
}

/// ANSI color of the level tag on the console.
const fn level_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Trace => "\x1b[34m",
        Severity::Debug => "\x1b[36m",
        Severity::Diagnostic => "\x1b[35m",
        Severity::Info => "\x1b[32m",
        Severity::Warning => "\x1b[33m",
        Severity::Error => "\x1b[31m",
        Severity::Critical => "\x1b[31;47m",
    }
}

/// `[<LEVEL>] <message>`, level tag colorized per severity.
///
/// # Examples
///
/// ```
/// use gwcore::logging::{ConsoleFormat, Record, Severity};
///
/// let record = Record::new(Severity::Warning, "root", "disk almost full");
/// assert_eq!(ConsoleFormat::new(false).format(&record), "[WARNING] disk almost full");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleFormat {
    color: bool,
}

impl ConsoleFormat {
    /// A console format; `color` is further gated by [`color_enabled`].
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render `record` for the console (no trailing newline).
    #[must_use]
    pub fn format(&self, record: &Record) -> String {
        let name = record.severity.name();
        let mut out = if self.color && color_enabled() {
            format!(
                "[{}{name}{RESET}] {MESSAGE_COLOR}{}{RESET}",
                level_color(record.severity),
                record.message
            )
        } else {
            format!("[{name}] {}", record.message)
        };
        if let Some(exception) = &record.exception {
            let _ = write!(out, "\n{exception}");
        }
        out
    }
}

/// `<YYYY-MM-DD HH:MM:SS> <LEVEL> <<logger>> <message> <file> <line> <func>`.
///
/// ANSI sequences are stripped from the message; unknown source-location
/// parts render as `-`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileFormat;

impl FileFormat {
    /// Render `record` for a log file (no trailing newline).
    #[must_use]
    pub fn format(self, record: &Record) -> String {
        let mut out = format!(
            "{} {:<width$} <{}> {} {} {} {}",
            format_timestamp(&record.timestamp),
            record.severity,
            record.logger,
            strip_ansi(&record.message),
            record.file.as_deref().unwrap_or("-"),
            record.line.map_or_else(|| "-".to_string(), |line| line.to_string()),
            record.func.as_deref().unwrap_or("-"),
            width = Severity::NAME_WIDTH,
        );
        if let Some(exception) = &record.exception {
            let _ = write!(out, "\n{}", strip_ansi(exception));
        }
        out
    }
}
