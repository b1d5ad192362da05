//! The last stop for errors that escaped the application.
//!
//! [`log_uncaught`] logs one record for an escaped error and turns it into a
//! suggested exit code. [`run_guarded`] wraps a whole `main` body with it, and
//! [`install_panic_hook`] routes panics into the same logger.
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use crate::error::{GwError, SysExit};
use crate::logging::{Logger, Severity, UNCAUGHT_PREFIX};

/// Log an escaped error and return the exit code it suggests.
///
/// `None` logs nothing and returns [`SysExit::Ok`]. Otherwise the error is
/// logged through [`Logger::uncaught`] on `logger` (the root logger when
/// `None`) and the exit code of the first [`GwError`] in its source chain is
/// returned, or [`SysExit::Error`] when the chain holds none.
///
/// # Examples
///
/// ```
/// use gwcore::error::{GwError, SysExit};
/// use gwcore::funnel::log_uncaught;
///
/// assert_eq!(log_uncaught(None, None), SysExit::Ok);
/// let err = GwError::config("no such section");
/// assert_eq!(log_uncaught(Some(&err), None), SysExit::Config);
/// ```
#[track_caller]
pub fn log_uncaught(err: Option<&(dyn StdError + 'static)>, logger: Option<&Logger>) -> SysExit {
    let Some(err) = err else {
        return SysExit::Ok;
    };
    match logger {
        Some(logger) => logger.uncaught(err),
        None => Logger::root().uncaught(err),
    }
    GwError::find_in_chain(err).map_or(SysExit::Error, GwError::exit_code)
}

/// Whether the application may carry on after an error with this exit code.
///
/// Warnings (and success) continue; anything from ERROR up stops.
#[must_use]
pub const fn should_continue(exit: SysExit) -> bool {
    !exit.is_fatal()
}

/// Run `body`, funnel whatever escapes it, and produce the process exit code.
///
/// An `Err` goes through [`log_uncaught`]. A panic yields
/// [`SysExit::Software`]; it is logged only if [`install_panic_hook`] was
/// called beforehand.
pub fn run_guarded<F>(logger: &Logger, body: F) -> ExitCode
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let exit = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => SysExit::Ok,
        Ok(Err(err)) => {
            let err: &(dyn StdError + 'static) = err.as_ref();
            log_uncaught(Some(err), Some(logger))
        }
        Err(_) => SysExit::Software,
    };
    exit.into()
}

/// Replace the panic hook with one that logs a CRITICAL uncaught record.
///
/// The record reads `"Uncaught error detected: panic: <message> (<file>:<line>)"`.
/// The previous hook is dropped, so nothing else is printed.
pub fn install_panic_hook(logger: Logger) {
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("Box<dyn Any>");
        let location = info
            .location()
            .map(|loc| format!(" ({}:{})", loc.file(), loc.line()))
            .unwrap_or_default();
        logger.log(
            Severity::Critical,
            format!("{UNCAUGHT_PREFIX}: panic: {message}{location}"),
        );
    }));
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Interpretation;
    use crate::logging::CaptureHandler;

    fn captured(name: &str) -> (Logger, Arc<CaptureHandler>) {
        let log = Logger::get(name);
        log.clear_handlers();
        log.set_level(Some(Severity::Trace));
        let capture = Arc::new(CaptureHandler::new(Severity::Trace));
        log.add_handler(capture.clone());
        (log, capture)
    }

    #[test]
    fn nothing_to_funnel() {
        let (log, capture) = captured("funnel_tests.none");
        assert_eq!(log_uncaught(None, Some(&log)), SysExit::Ok);
        assert!(capture.records().is_empty());
    }

    #[test]
    fn config_error_exit_and_one_record() {
        let (log, capture) = captured("funnel_tests.config");
        let err = GwError::config("no section [main]").with_log_level(Severity::Critical);
        assert_eq!(log_uncaught(Some(&err), Some(&log)), SysExit::Config);
        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Critical);
        assert!(records[0].message.starts_with(UNCAUGHT_PREFIX));
    }

    #[test]
    fn foreign_error_is_generic_error() {
        let (log, _capture) = captured("funnel_tests.foreign");
        let err = std::io::Error::other("boom");
        assert_eq!(log_uncaught(Some(&err), Some(&log)), SysExit::Error);
    }

    #[test]
    fn exit_code_found_behind_context() {
        let (log, capture) = captured("funnel_tests.context");
        let err = anyhow::Error::new(GwError::value("bad width")).context("drawing");
        let err: &(dyn StdError + 'static) = err.as_ref();
        assert_eq!(log_uncaught(Some(err), Some(&log)), SysExit::Usage);
        let exception = capture.records()[0].exception.clone().unwrap();
        assert!(exception.contains("Caused by: bad width"), "{exception}");
    }

    #[test]
    fn warnings_continue() {
        let (log, _capture) = captured("funnel_tests.warning");
        let err = GwError::config_setting(Interpretation::new("color", "mauve"));
        let exit = log_uncaught(Some(&err), Some(&log));
        assert_eq!(exit, SysExit::Warning);
        assert!(should_continue(exit));
        assert!(should_continue(SysExit::Ok));
        assert!(!should_continue(SysExit::Error));
        assert!(!should_continue(SysExit::Config));
    }

    #[test]
    fn run_guarded_maps_outcomes() {
        let (log, capture) = captured("funnel_tests.guarded");
        assert_eq!(run_guarded(&log, || Ok(())), ExitCode::SUCCESS);
        assert_eq!(
            run_guarded(&log, || Err(GwError::config("broken").into())),
            ExitCode::from(78)
        );
        assert_eq!(capture.records().len(), 1);
    }

    #[test]
    fn run_guarded_catches_panics() {
        let (log, _capture) = captured("funnel_tests.panic");
        let code = run_guarded(&log, || panic!("kaboom"));
        assert_eq!(code, ExitCode::from(SysExit::Software.code()));
    }
}
