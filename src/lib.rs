//! Application configuration and diagnostics core.
//!
//! Shared plumbing for small command-line and desktop tools: a leveled
//! logger with colorized console and rotating file output, a catalogue of
//! standard command-line flags, INI files with typed getters, process-wide
//! settings and state registries, and an error taxonomy that carries
//! suggested exit codes.
//!
//! The public API is organised into five layers:
//!
//! - **[`error`]**: the error taxonomy and `sysexits` exit codes
//! - **[`logging`]**: severities, named loggers, handlers and formatters
//! - **[`cli`]**: the standard flag schema, built on `clap`
//! - **[`config`]**: INI parsing, converters, settings and state
//! - **[`funnel`]**: logging and exit codes for errors that reach the top
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
pub mod error;
pub mod funnel;
pub mod logging;

pub use error::{ErrorKind, GwError, Interpretation, Result, SysExit};
