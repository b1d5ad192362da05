//! Named-logger registry and the tracing layer that routes events to handlers.
//!
//! Loggers are identified by dotted names (`"app.io"`); `"root"` is the
//! top of the hierarchy. A record emitted on a logger goes to that logger's
//! handlers and then to each ancestor's, up to `root`. A logger without its
//! own level uses the nearest ancestor's; the root defaults to WARNING.
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Once, PoisonError, RwLock};

use super::handler::{ConsoleHandler, Handler};
use super::level::Severity;
use super::record::Record;
use super::utils::now_local;

/// Name of the root logger.
pub const ROOT: &str = "root";

/// Level of the root logger until one is configured.
pub const ROOT_DEFAULT_LEVEL: Severity = Severity::Warning;

/// Level of the built-in last-resort handler.
pub const LAST_RESORT_LEVEL: Severity = Severity::Warning;

/// Target of the tracing events emitted by [`Logger`](super::Logger).
pub(super) const EVENT_TARGET: &str = "gwcore";

#[derive(Default)]
struct LoggerEntry {
    level: Option<Severity>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl fmt::Debug for LoggerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerEntry")
            .field("level", &self.level)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Per-name levels and handlers.
pub(super) struct Registry {
    loggers: RwLock<HashMap<String, LoggerEntry>>,
    /// Receives records whose lineage has no handler at all.
    last_resort: RwLock<Arc<dyn Handler>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            loggers: RwLock::default(),
            last_resort: RwLock::new(Arc::new(ConsoleHandler::stderr(
                LAST_RESORT_LEVEL,
                false,
            ))),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("loggers", &self.loggers)
            .finish_non_exhaustive()
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::default);

/// Set once the router could not become the global subscriber.
static DIRECT_DISPATCH: AtomicBool = AtomicBool::new(false);

static INSTALL: Once = Once::new();

/// The process-wide registry.
pub(super) fn registry() -> &'static Registry {
    &REGISTRY
}

/// Canonical name for a logger; the empty name is the root.
pub(super) fn canonical_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        ROOT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `name`, then each dotted parent, then the root.
fn lineage(name: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = name;
    loop {
        chain.push(current.to_string());
        match current.rsplit_once('.') {
            Some((parent, _)) if !parent.is_empty() => current = parent,
            _ => break,
        }
    }
    if name != ROOT {
        chain.push(ROOT.to_string());
    }
    chain
}

impl Registry {
    pub(super) fn level(&self, name: &str) -> Option<Severity> {
        self.loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|entry| entry.level)
    }

    pub(super) fn set_level(&self, name: &str, level: Option<Severity>) {
        self.loggers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .level = level;
    }

    pub(super) fn effective_level(&self, name: &str) -> Severity {
        let loggers = self.loggers.read().unwrap_or_else(PoisonError::into_inner);
        lineage(name)
            .iter()
            .find_map(|n| loggers.get(n).and_then(|entry| entry.level))
            .unwrap_or(ROOT_DEFAULT_LEVEL)
    }

    pub(super) fn add_handler(&self, name: &str, handler: Arc<dyn Handler>) {
        self.loggers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .handlers
            .push(handler);
    }

    pub(super) fn clear_handlers(&self, name: &str) {
        if let Some(entry) = self
            .loggers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(name)
        {
            entry.handlers.clear();
        }
    }

    pub(super) fn handler_count(&self, name: &str) -> usize {
        self.loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |entry| entry.handlers.len())
    }

    /// Handlers that see a record emitted on `name`, own handlers first.
    fn handlers_for(&self, name: &str) -> Vec<Arc<dyn Handler>> {
        let loggers = self.loggers.read().unwrap_or_else(PoisonError::into_inner);
        lineage(name)
            .iter()
            .filter_map(|n| loggers.get(n))
            .flat_map(|entry| entry.handlers.iter().cloned())
            .collect()
    }

    pub(super) fn set_last_resort(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        let mut slot = self
            .last_resort
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, handler)
    }

    fn last_resort(&self) -> Arc<dyn Handler> {
        self.last_resort
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hand `record` to every handler along its logger's lineage whose
    /// level admits it, or to the last-resort handler when the lineage has
    /// no handler at all. The registry lock is released before emitting.
    pub(super) fn dispatch(&self, record: &Record) {
        let mut handlers = self.handlers_for(&record.logger);
        if handlers.is_empty() {
            handlers.push(self.last_resort());
        }
        for handler in handlers {
            if record.severity >= handler.level() {
                handler.emit(record);
            }
        }
    }
}

/// Install the [`Router`] as the global tracing subscriber.
///
/// Idempotent. When another global subscriber is already in place, loggers
/// fall back to handing records straight to their handlers, and their
/// tracing events still reach the foreign subscriber.
pub fn install() {
    use tracing_subscriber::layer::SubscriberExt as _;

    INSTALL.call_once(|| {
        let subscriber = tracing_subscriber::registry().with(Router);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            DIRECT_DISPATCH.store(true, Ordering::Relaxed);
        }
    });
}

/// Replace the handler that receives records when no logger along their
/// lineage has a handler, and return the previous one.
///
/// The built-in one writes uncolored console lines to stderr at
/// [`LAST_RESORT_LEVEL`] and above, so failures before logging is
/// configured are still reported.
pub fn set_last_resort(handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
    registry().set_last_resort(handler)
}

/// Whether loggers must dispatch records themselves.
pub(super) fn direct_dispatch() -> bool {
    DIRECT_DISPATCH.load(Ordering::Relaxed)
}

/// Event fields the router understands.
#[derive(Default)]
struct RecordFields {
    message: String,
    logger: Option<String>,
    severity: Option<u64>,
    file: Option<String>,
    line: Option<u64>,
    func: Option<String>,
    exception: Option<String>,
}

impl tracing::field::Visit for RecordFields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "logger" => self.logger = Some(value.to_string()),
            "src_file" => self.file = Some(value.to_string()),
            "src_func" => self.func = Some(value.to_string()),
            "exception" => self.exception = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        match field.name() {
            "severity" => self.severity = Some(value),
            "src_line" => self.line = Some(value),
            _ => {}
        }
    }
}

/// A [`tracing_subscriber::Layer`] that turns events into [`Record`]s and
/// dispatches them through the logger registry.
///
/// Events from [`Logger`](super::Logger) carry their logger name and exact
/// severity as fields and have already passed the logger's level check.
/// Plain tracing events from elsewhere are treated as records on the root
/// logger at the severity matching their tracing level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Router;

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Router {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let mut fields = RecordFields::default();
        event.record(&mut fields);

        let severity = fields
            .severity
            .and_then(Severity::from_value)
            .unwrap_or_else(|| Severity::from_tracing(*metadata.level()));
        let logger = match fields.logger {
            Some(name) => name,
            None => {
                if severity < registry().effective_level(ROOT) {
                    return;
                }
                ROOT.to_string()
            }
        };

        let record = Record {
            timestamp: now_local(),
            severity,
            logger,
            message: fields.message,
            file: fields.file.or_else(|| metadata.file().map(String::from)),
            line: fields
                .line
                .and_then(|l| u32::try_from(l).ok())
                .or_else(|| metadata.line()),
            func: fields
                .func
                .or_else(|| metadata.module_path().map(String::from)),
            exception: fields.exception,
        };
        registry().dispatch(&record);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::handler::{CaptureHandler, MockHandler};

    #[test]
    fn lineage_walks_dotted_parents() {
        assert_eq!(lineage("a.b.c"), vec!["a.b.c", "a.b", "a", "root"]);
        assert_eq!(lineage("root"), vec!["root"]);
        assert_eq!(lineage("solo"), vec!["solo", "root"]);
    }

    #[test]
    fn canonical_name_maps_empty_to_root() {
        assert_eq!(canonical_name(""), "root");
        assert_eq!(canonical_name(" app "), "app");
    }

    #[test]
    fn effective_level_inherits_from_parent() {
        let reg = Registry::default();
        assert_eq!(reg.effective_level("x.y"), ROOT_DEFAULT_LEVEL);
        reg.set_level("x", Some(Severity::Debug));
        assert_eq!(reg.effective_level("x.y"), Severity::Debug);
        reg.set_level("x.y", Some(Severity::Error));
        assert_eq!(reg.effective_level("x.y"), Severity::Error);
    }

    #[test]
    fn dispatch_filters_per_handler_and_propagates() {
        let reg = Registry::default();
        let parent = Arc::new(CaptureHandler::new(Severity::Warning));
        let child = Arc::new(CaptureHandler::new(Severity::Trace));
        reg.add_handler("svc", parent.clone());
        reg.add_handler("svc.db", child.clone());

        reg.dispatch(&Record::new(Severity::Info, "svc.db", "connected"));
        reg.dispatch(&Record::new(Severity::Error, "svc.db", "lost"));

        assert_eq!(child.messages(), vec!["connected", "lost"]);
        assert_eq!(parent.messages(), vec!["lost"]);
    }

    #[test]
    fn dispatch_calls_mock_once_at_exact_level() {
        let reg = Registry::default();
        let mut mock = MockHandler::new();
        mock.expect_level().return_const(Severity::Debug);
        mock.expect_emit()
            .withf(|record: &Record| record.severity == Severity::Critical)
            .times(1)
            .return_const(());
        reg.add_handler("mocked", Arc::new(mock));
        reg.dispatch(&Record::new(Severity::Critical, "mocked", "boom"));
    }

    #[test]
    fn handlerless_lineage_falls_back_to_last_resort() {
        let reg = Registry::default();
        let fallback = Arc::new(CaptureHandler::new(Severity::Warning));
        reg.set_last_resort(fallback.clone());

        reg.dispatch(&Record::new(Severity::Critical, "orphan.child", "nobody listens"));
        reg.dispatch(&Record::new(Severity::Info, "orphan.child", "too quiet"));
        assert_eq!(fallback.messages(), vec!["nobody listens"]);

        let own = Arc::new(CaptureHandler::new(Severity::Trace));
        reg.add_handler("orphan", own.clone());
        reg.dispatch(&Record::new(Severity::Error, "orphan.child", "handled"));
        assert_eq!(own.messages(), vec!["handled"]);
        assert_eq!(fallback.messages().len(), 1, "unused once a handler exists");
    }

    #[test]
    fn clear_handlers_only_touches_one_logger() {
        let reg = Registry::default();
        reg.add_handler("a", Arc::new(CaptureHandler::new(Severity::Info)));
        reg.add_handler("b", Arc::new(CaptureHandler::new(Severity::Info)));
        reg.clear_handlers("a");
        assert_eq!(reg.handler_count("a"), 0);
        assert_eq!(reg.handler_count("b"), 1);
    }
}
