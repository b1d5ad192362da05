//! Named loggers with the extended severity methods.
use std::error::Error as StdError;
use std::fmt;
use std::fmt::Write as _;
use std::panic::Location;
use std::sync::Arc;

use super::handler::Handler;
use super::level::Severity;
use super::record::Record;
use super::router::{self, EVENT_TARGET, ROOT, canonical_name, registry};
use super::utils::now_local;
use crate::error::GwError;

/// Fixed prefix of records written by [`Logger::uncaught`].
pub const UNCAUGHT_PREFIX: &str = "Uncaught error detected";

/// Emit a tracing event carrying a record's routing fields at a fixed level.
macro_rules! record_event {
    ($level:expr, $record:expr) => {
        tracing::event!(
            target: EVENT_TARGET,
            $level,
            logger = $record.logger.as_str(),
            severity = u64::from($record.severity.value()),
            src_file = $record.file.as_deref(),
            src_line = $record.line,
            exception = $record.exception.as_deref(),
            "{}",
            $record.message
        )
    };
}

/// A handle on a named logger.
///
/// Handles are cheap to clone; levels and handlers live in a process-wide
/// registry keyed by name, so two handles with the same name are the same
/// logger.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gwcore::logging::{CaptureHandler, Logger, Severity};
///
/// let log = Logger::get("doc.example");
/// log.set_level(Some(Severity::Diagnostic));
/// let capture = Arc::new(CaptureHandler::new(Severity::Trace));
/// log.add_handler(capture.clone());
///
/// log.diagnostic("shown");
/// log.debug("filtered out");
/// assert_eq!(capture.messages(), vec!["shown"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Logger {
    name: String,
}

impl Logger {
    /// The logger called `name`; an empty name is the root logger.
    ///
    /// Installs the tracing router on first use.
    #[must_use]
    pub fn get(name: &str) -> Self {
        router::install();
        Self {
            name: canonical_name(name),
        }
    }

    /// The root logger.
    #[must_use]
    pub fn root() -> Self {
        Self::get(ROOT)
    }

    /// Dotted name of this logger.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The level set on this logger itself, if any.
    #[must_use]
    pub fn level(&self) -> Option<Severity> {
        registry().level(&self.name)
    }

    /// Set (or with `None`, unset) this logger's own level.
    pub fn set_level(&self, level: Option<Severity>) {
        registry().set_level(&self.name, level);
    }

    /// The level in force: this logger's own, else the nearest ancestor's.
    #[must_use]
    pub fn effective_level(&self) -> Severity {
        registry().effective_level(&self.name)
    }

    /// Whether a record at `severity` would be emitted.
    #[must_use]
    pub fn is_enabled_for(&self, severity: Severity) -> bool {
        severity >= self.effective_level()
    }

    /// Attach a handler.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        registry().add_handler(&self.name, handler);
    }

    /// Detach every handler of this logger (ancestors are untouched).
    pub fn clear_handlers(&self) {
        registry().clear_handlers(&self.name);
    }

    /// Number of handlers attached to this logger itself.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        registry().handler_count(&self.name)
    }

    /// Emit `message` at `severity` if enabled.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        if self.is_enabled_for(severity) {
            self.emit(severity, message.to_string(), Location::caller(), None);
        }
    }

    /// Entry/exit breadcrumbs.
    #[track_caller]
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Severity::Trace, message);
    }

    /// Developer debugging output.
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    /// Noisy informational output meant for developers.
    #[track_caller]
    pub fn diagnostic(&self, message: impl fmt::Display) {
        self.log(Severity::Diagnostic, message);
    }

    /// Normal progress message.
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    /// Something unexpected that does not stop the run.
    #[track_caller]
    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Severity::Warning, message);
    }

    /// A failure of the current operation.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    /// A failure the application cannot recover from.
    #[track_caller]
    pub fn critical(&self, message: impl fmt::Display) {
        self.log(Severity::Critical, message);
    }

    /// Log an error with its source chain attached.
    ///
    /// The record's severity is the `log_level` of the first [`GwError`]
    /// found in `err`'s chain, or ERROR for any other error.
    #[track_caller]
    pub fn exception(&self, err: &(dyn StdError + 'static)) {
        self.log_error(err, err.to_string(), Location::caller());
    }

    /// Like [`exception`](Self::exception), with the message prefixed by
    /// [`UNCAUGHT_PREFIX`]. Meant for errors that reached the top level.
    #[track_caller]
    pub fn uncaught(&self, err: &(dyn StdError + 'static)) {
        self.log_error(err, format!("{UNCAUGHT_PREFIX}: {err}"), Location::caller());
    }

    fn log_error(
        &self,
        err: &(dyn StdError + 'static),
        message: String,
        location: &'static Location<'static>,
    ) {
        let severity = GwError::find_in_chain(err).map_or(Severity::Error, GwError::log_level);
        if self.is_enabled_for(severity) {
            self.emit(severity, message, location, Some(render_chain(err)));
        }
    }

    fn emit(
        &self,
        severity: Severity,
        message: String,
        location: &'static Location<'static>,
        exception: Option<String>,
    ) {
        let record = Record {
            timestamp: now_local(),
            severity,
            logger: self.name.clone(),
            message,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
            func: None,
            exception,
        };
        if router::direct_dispatch() {
            registry().dispatch(&record);
        }
        match severity {
            Severity::Trace => record_event!(tracing::Level::TRACE, record),
            Severity::Debug => record_event!(tracing::Level::DEBUG, record),
            Severity::Diagnostic | Severity::Info => record_event!(tracing::Level::INFO, record),
            Severity::Warning => record_event!(tracing::Level::WARN, record),
            Severity::Error | Severity::Critical => record_event!(tracing::Level::ERROR, record),
        }
    }
}

/// `Kind: message` followed by one `Caused by:` line per source.
fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let kind = err
        .downcast_ref::<GwError>()
        .map_or("Error", |own| own.kind().name());
    let mut out = format!("{kind}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\n  Caused by: {cause}");
        source = cause.source();
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::Interpretation;
    use crate::logging::handler::CaptureHandler;

    fn captured(name: &str, level: Severity) -> (Logger, Arc<CaptureHandler>) {
        let log = Logger::get(name);
        log.clear_handlers();
        log.set_level(Some(level));
        let capture = Arc::new(CaptureHandler::new(Severity::Trace));
        log.add_handler(capture.clone());
        (log, capture)
    }

    #[test]
    fn extended_levels_are_filtered_in_core() {
        let (log, capture) = captured("logger_tests.extended", Severity::Diagnostic);
        log.trace("t");
        log.debug("d");
        log.diagnostic("diag");
        log.info("i");
        let levels: Vec<Severity> = capture.records().iter().map(|r| r.severity).collect();
        assert_eq!(levels, vec![Severity::Diagnostic, Severity::Info]);
    }

    #[test]
    fn trace_level_lets_everything_through() {
        let (log, capture) = captured("logger_tests.trace", Severity::Trace);
        log.trace("crumb");
        log.critical("down");
        assert_eq!(capture.messages(), vec!["crumb", "down"]);
        assert_eq!(capture.records()[0].severity, Severity::Trace);
    }

    #[test]
    fn record_carries_call_site() {
        let (log, capture) = captured("logger_tests.location", Severity::Info);
        log.info("here");
        let record = &capture.records()[0];
        assert_eq!(record.logger, "logger_tests.location");
        assert!(record.file.as_deref().unwrap().ends_with("logger.rs"));
        assert!(record.line.is_some());
    }

    #[test]
    fn exception_uses_error_log_level() {
        let (log, capture) = captured("logger_tests.exception", Severity::Debug);
        let err = GwError::config("bad").with_log_level(Severity::Critical);
        log.exception(&err);
        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Critical);
        assert_eq!(records[0].message, "bad");
        assert_eq!(records[0].exception.as_deref(), Some("ConfigError: bad"));
    }

    #[test]
    fn exception_defaults_to_error_for_foreign_errors() {
        let (log, capture) = captured("logger_tests.foreign", Severity::Debug);
        let err = std::io::Error::other("disk gone");
        log.exception(&err);
        assert_eq!(capture.records()[0].severity, Severity::Error);
    }

    #[test]
    fn warning_exception_is_logged_as_warning() {
        let (log, capture) = captured("logger_tests.warning", Severity::Debug);
        let err = GwError::value_interpretation(Interpretation::new("n", "x"));
        log.exception(&err);
        assert_eq!(capture.records()[0].severity, Severity::Warning);
    }

    #[test]
    fn uncaught_prefixes_sentinel() {
        let (log, capture) = captured("logger_tests.uncaught", Severity::Debug);
        log.uncaught(&GwError::error("kaput"));
        let message = &capture.messages()[0];
        assert!(message.starts_with(UNCAUGHT_PREFIX), "{message}");
        assert!(message.ends_with("kaput"), "{message}");
    }

    #[test]
    fn exception_below_level_is_dropped() {
        let (log, capture) = captured("logger_tests.quiet", Severity::Error);
        log.exception(&GwError::warning("minor"));
        assert!(capture.records().is_empty());
    }

    #[test]
    fn render_chain_lists_causes() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = GwError::from_io(io_err, std::path::Path::new("a.ini"));
        let rendered = render_chain(&err);
        assert!(rendered.starts_with("FileNotFoundError: a.ini"), "{rendered}");
        assert!(rendered.contains("Caused by: missing"), "{rendered}");
    }

    #[test]
    fn child_records_propagate_to_parent_handlers() {
        let (_parent, capture) = captured("logger_tests.tree", Severity::Info);
        let child = Logger::get("logger_tests.tree.leaf");
        child.warning("from the leaf");
        assert_eq!(capture.messages(), vec!["from the leaf"]);
        assert_eq!(capture.records()[0].logger, "logger_tests.tree.leaf");
    }
}
