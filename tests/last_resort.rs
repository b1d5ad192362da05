#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Records on a lineage without handlers reach the last-resort handler.
//!
//! The last-resort handler is process-wide, so it gets a test binary of its
//! own.

use std::sync::Arc;

use gwcore::error::{GwError, SysExit};
use gwcore::funnel::log_uncaught;
use gwcore::logging::{
    CaptureHandler, LAST_RESORT_LEVEL, Logger, Severity, UNCAUGHT_PREFIX, set_last_resort,
};

/// An error escaping before logging is configured is still reported once.
#[test]
fn uncaught_error_without_handlers_is_reported() {
    let fallback = Arc::new(CaptureHandler::new(LAST_RESORT_LEVEL));
    set_last_resort(fallback.clone());
    let logger = Logger::get("last_resort_it.startup");
    assert_eq!(logger.handler_count(), 0);
    assert_eq!(Logger::root().handler_count(), 0);

    let err = GwError::config("bad.ini: entry outside of section at line 1")
        .with_log_level(Severity::Critical);
    let exit = log_uncaught(Some(&err), Some(&logger));

    assert_eq!(exit, SysExit::Config);
    let records = fallback.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Critical);
    assert_eq!(records[0].logger, "last_resort_it.startup");
    assert!(records[0].message.starts_with(UNCAUGHT_PREFIX), "{}", records[0].message);
}
