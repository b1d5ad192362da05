//! Leveled logging with named loggers, colorized console output and
//! rotating log files.
//!
//! Records flow through `tracing`: [`Logger`] methods emit tracing events
//! carrying the extended [`Severity`], and the [`Router`] layer hands them
//! to the [`Handler`]s attached along the logger's dotted name.

mod format;
mod handler;
mod level;
mod logger;
mod record;
mod router;
mod setup;
mod utils;

pub use format::{ConsoleFormat, FileFormat, color_enabled, set_color_enabled};
pub use handler::{CaptureHandler, ConsoleHandler, Handler, RotatingFileHandler};
pub use level::{Severity, UnknownSeverity};
pub use logger::{Logger, UNCAUGHT_PREFIX};
pub use record::Record;
pub use router::{LAST_RESORT_LEVEL, ROOT, ROOT_DEFAULT_LEVEL, Router, install, set_last_resort};
pub use setup::{LogConfig, config_logger, setup_logging};
