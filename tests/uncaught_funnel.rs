#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for errors that reach the top of the application.

mod common;

use std::process::ExitCode;

use common::*;
use gwcore::config::ConfigParser;
use gwcore::error::{GwError, SysExit};
use gwcore::funnel::{log_uncaught, run_guarded, should_continue};
use gwcore::logging::{Severity, UNCAUGHT_PREFIX};

/// A CRITICAL configuration error produces one CRITICAL record and exit 78.
#[test]
fn critical_config_error_exits_78() {
    let (logger, capture) = captured_logger("funnel_it.critical", Severity::Info);
    let err = GwError::config("no [main] section").with_log_level(Severity::Critical);

    let exit = log_uncaught(Some(&err), Some(&logger));

    assert_eq!(exit.code(), 78);
    assert!(!should_continue(exit));
    let records = capture.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Critical);
    assert_eq!(
        records[0].message,
        format!("{UNCAUGHT_PREFIX}: no [main] section")
    );
    assert_eq!(records[0].exception.as_deref(), Some("ConfigError: no [main] section"));
}

/// A malformed INI file surfaces from a guarded body as a config error.
#[test]
fn malformed_config_through_run_guarded() {
    let ctx = IntegrationTestContext::new();
    let ini = ctx.write_file("bad.ini", "key before any section\n");
    let (logger, capture) = captured_logger("funnel_it.guarded", Severity::Info);

    let code = run_guarded(&logger, || {
        ConfigParser::from_path(&ini)?;
        Ok(())
    });

    assert_eq!(code, ExitCode::from(SysExit::Config));
    let records = capture.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Error);
    assert!(records[0].message.contains("bad.ini"), "{}", records[0].message);
}

/// Errors below the logger's level are not written but still decide the
/// exit code.
#[test]
fn filtered_error_still_sets_exit_code() {
    let (logger, capture) = captured_logger("funnel_it.quiet", Severity::Critical);
    let exit = log_uncaught(Some(&GwError::index("row 9 of 3")), Some(&logger));
    assert_eq!(exit, SysExit::Usage);
    assert!(capture.records().is_empty());
}
