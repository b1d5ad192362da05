// Shared helpers for integration tests.
//
// Provides a temporary directory for INI and state files, a capturing logger
// and a one-call argv parser so each integration test can run a start-up
// sequence in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gwcore::cli::{CliArgs, CliSchema};
use gwcore::logging::{CaptureHandler, Logger, Severity};

/// An isolated working directory backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding the test files.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new, empty context.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        Self { root }
    }

    /// Path to the context root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write `content` to `name` under the root and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        std::fs::write(&path, content).expect("write test file");
        path
    }

    /// Read `name` under the root.
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.root.path().join(name)).expect("read test file")
    }
}

/// Parse `argv` against `schema`, panicking on a usage error.
pub fn parse_args(schema: &CliSchema, argv: &[&str]) -> CliArgs {
    let matches = schema
        .command()
        .try_get_matches_from(argv)
        .expect("arguments should parse");
    CliArgs::from_matches(schema, &matches)
}

/// A logger with a fresh capturing handler and its own level.
///
/// Use a distinct `name` per test; loggers are process-wide.
pub fn captured_logger(name: &str, level: Severity) -> (Logger, Arc<CaptureHandler>) {
    let logger = Logger::get(name);
    logger.clear_handlers();
    logger.set_level(Some(level));
    let capture = Arc::new(CaptureHandler::new(Severity::Trace));
    logger.add_handler(capture.clone());
    (logger, capture)
}
