#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing,
    clippy::panic
)]
//! The panic hook is process-wide, so it gets a test binary of its own.

mod common;

use std::process::ExitCode;

use common::*;
use gwcore::error::SysExit;
use gwcore::funnel::{install_panic_hook, run_guarded};
use gwcore::logging::{Severity, UNCAUGHT_PREFIX};

#[test]
fn panics_are_logged_as_critical() {
    let (logger, capture) = captured_logger("panic_it", Severity::Info);
    install_panic_hook(logger.clone());

    let code = run_guarded(&logger, || panic!("index went sideways"));

    assert_eq!(code, ExitCode::from(SysExit::Software));
    let records = capture.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Critical);
    let message = &records[0].message;
    assert!(
        message.starts_with(&format!("{UNCAUGHT_PREFIX}: panic: index went sideways")),
        "{message}"
    );
    assert!(message.contains("panic_hook.rs"), "{message}");
}
