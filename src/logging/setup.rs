//! Logger configuration from settings.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use super::format::set_color_enabled;
use super::handler::{ConsoleHandler, RotatingFileHandler};
use super::level::Severity;
use super::logger::Logger;
use super::router::{self, ROOT};
use crate::config::{Settings, Value, as_bool, as_path};

/// Options recognized by [`config_logger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Console minimum severity.
    pub log_level: Severity,
    /// Optional rotating log file.
    pub log_file: Option<PathBuf>,
    /// File minimum severity.
    pub log_file_level: Severity,
    /// Maximum bytes per file before rolling over.
    pub log_file_size: u64,
    /// Number of rolled-over files kept.
    pub log_file_rotations: u32,
    /// Suppress console coloring.
    pub no_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: Severity::Info,
            log_file: None,
            log_file_level: Severity::Debug,
            log_file_size: 1_000_000,
            log_file_rotations: 3,
            no_color: false,
        }
    }
}

impl LogConfig {
    /// Read the options from `settings`; absent or empty keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns a plain error (not a [`GwError`](crate::GwError)) when a key
    /// holds a value of the wrong type or out of range.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = settings.peek("log_level") {
            config.log_level = severity_of("log_level", value)?;
        }
        if let Some(value) = settings.peek("log_file") {
            config.log_file = match value {
                Value::Path(p) => Some(p.clone()),
                Value::Text(s) if s.trim().is_empty() => None,
                Value::Text(s) => Some(as_path(s)),
                other => bail!("log_file: expected a path, found {}", other.type_name()),
            };
        }
        if let Some(value) = settings.peek("log_file_level") {
            config.log_file_level = severity_of("log_file_level", value)?;
        }
        if let Some(value) = settings.peek("log_file_size") {
            config.log_file_size = number_of("log_file_size", value)?;
        }
        if let Some(value) = settings.peek("log_file_rotations") {
            config.log_file_rotations = number_of("log_file_rotations", value)?;
        }
        if let Some(value) = settings.peek("no_color") {
            config.no_color = match value {
                Value::Bool(b) => *b,
                Value::Text(s) => as_bool(s),
                other => bail!("no_color: expected a flag, found {}", other.type_name()),
            };
        }
        Ok(config)
    }

    /// Level the logger itself filters at: the lower of the console and
    /// file levels, or the console level when there is no file.
    #[must_use]
    pub fn logger_level(&self) -> Severity {
        if self.log_file.is_some() {
            self.log_level.min(self.log_file_level)
        } else {
            self.log_level
        }
    }
}

fn severity_of(key: &str, value: &Value) -> Result<Severity> {
    match value {
        Value::Severity(s) => Ok(*s),
        Value::Text(s) => s
            .parse::<Severity>()
            .with_context(|| format!("{key}: {s:?} is not a log level")),
        Value::Int(n) => u64::try_from(*n)
            .ok()
            .and_then(Severity::from_value)
            .with_context(|| format!("{key}: {n} is not a log level")),
        other => bail!("{key}: expected a log level, found {}", other.type_name()),
    }
}

fn number_of<T>(key: &str, value: &Value) -> Result<T>
where
    T: TryFrom<i64> + std::str::FromStr,
{
    let parsed = match value {
        Value::Int(n) => T::try_from(*n).ok(),
        Value::Text(s) => s.trim().parse().ok(),
        other => bail!("{key}: expected a number, found {}", other.type_name()),
    };
    parsed.with_context(|| format!("{key}: {value} is out of range"))
}

/// Replace the handlers of the logger called `name` according to `config`.
///
/// Other loggers are left alone. The logger gets one colorized stderr
/// handler at `log_level`, plus a rotating file handler at
/// `log_file_level` when `log_file` is set.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn config_logger(name: &str, config: &LogConfig) -> Result<Logger> {
    let logger = Logger::get(name);
    logger.clear_handlers();
    logger.set_level(Some(config.logger_level()));
    logger.add_handler(Arc::new(ConsoleHandler::stderr(
        config.log_level,
        !config.no_color,
    )));
    if let Some(path) = &config.log_file {
        let file = RotatingFileHandler::new(
            path,
            config.log_file_level,
            config.log_file_size,
            config.log_file_rotations,
        )
        .with_context(|| format!("opening log file {}", path.display()))?;
        logger.add_handler(Arc::new(file));
    }
    Ok(logger)
}

/// Install the router, set the process color switch and configure the
/// root logger.
///
/// # Errors
///
/// See [`config_logger`].
pub fn setup_logging(config: &LogConfig) -> Result<Logger> {
    router::install();
    set_color_enabled(!config.no_color);
    if !config.no_color {
        let _ = enable_ansi_support::enable_ansi_support();
    }
    config_logger(ROOT, config)
}
