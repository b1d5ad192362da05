//! Domain error taxonomy carrying suggested exit codes and log severities.
//!
//! Every error raised by the core is a [`GwError`]: an [`ErrorKind`] plus the
//! [`Severity`] it should be logged at. The kind decides the suggested
//! process exit code ([`SysExit`]); the severity defaults per kind and may be
//! overridden at construction with [`GwError::with_log_level`].
//!
//! # Error hierarchy
//!
//! ```text
//! GwError { kind, log_level }
//! ├── Error                 exit ERROR(2),   logged at ERROR
//! ├── Warning               exit WARNING(1), logged at WARNING
//! ├── Config                exit CONFIG(78), logged at ERROR
//! ├── ValueInterpretation   exit WARNING(1), logged at WARNING
//! ├── ConfigSetting         exit WARNING(1), logged at WARNING
//! ├── Value / Index         exit USAGE(64),  logged at ERROR
//! └── FileNotFound / FileExists / NotADirectory
//!                           exit ERROR(2),   logged at ERROR
//! ```
//!
//! The taxonomy holds data only. It never refers to the logger; the logger
//! and the uncaught funnel inspect it.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::logging::Severity;

/// Result alias used throughout the crate.
pub type Result<T, E = GwError> = std::result::Result<T, E>;

/// Suggested process exit codes, a subset of BSD `sysexits.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SysExit {
    /// Successful termination (0).
    Ok,
    /// Finished, but something deserves attention (1).
    Warning,
    /// Generic failure (2).
    Error,
    /// Command line usage error (64).
    Usage,
    /// Internal software error (70).
    Software,
    /// Temporary failure, the user is invited to retry (75).
    TempFail,
    /// Configuration error (78).
    Config,
}

impl SysExit {
    /// Every code in the subset.
    pub const ALL: [Self; 7] = [
        Self::Ok,
        Self::Warning,
        Self::Error,
        Self::Usage,
        Self::Software,
        Self::TempFail,
        Self::Config,
    ];

    /// Numeric exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Usage => 64,
            Self::Software => 70,
            Self::TempFail => 75,
            Self::Config => 78,
        }
    }

    /// Look up a code by number.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|exit| i32::from(exit.code()) == code)
    }

    /// `true` when the process should stop with this code (2 and above).
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        self.code() >= 2
    }
}

impl From<SysExit> for std::process::ExitCode {
    fn from(exit: SysExit) -> Self {
        Self::from(exit.code())
    }
}

impl fmt::Display for SysExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The parts of a "this value is invalid" message.
///
/// Renders as `"[In <context>, ]<key> = <value> is invalid.[ Possible values are: <list>]"`.
///
/// # Examples
///
/// ```
/// use gwcore::error::Interpretation;
///
/// let msg = Interpretation::new("color", "mauve")
///     .with_context("row 3")
///     .with_possible_values("red, green, blue")
///     .to_string();
/// assert_eq!(msg, "In row 3, color = mauve is invalid. Possible values are: red, green, blue");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Field or key name.
    pub key: String,
    /// The offending value, as written.
    pub value: String,
    /// Where the value came from (e.g., `"row 3"`).
    pub context: Option<String>,
    /// Human-readable list of acceptable values.
    pub possible_values: Option<String>,
}

impl Interpretation {
    /// Start a message for `key = value`.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            context: None,
            possible_values: None,
        }
    }

    /// Name where the value was found.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// List the values that would have been accepted.
    #[must_use]
    pub fn with_possible_values(mut self, possible_values: impl Into<String>) -> Self {
        self.possible_values = Some(possible_values.into());
        self
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "In {context}, ")?;
        }
        write!(f, "{} = {} is invalid.", self.key, self.value)?;
        if let Some(possible) = &self.possible_values {
            write!(f, " Possible values are: {possible}")?;
        }
        Ok(())
    }
}

/// The closed set of error kinds.
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// Generic error.
    #[error("{0}")]
    Error(String),

    /// Generic warning; the run may continue.
    #[error("{0}")]
    Warning(String),

    /// A configuration problem (missing path, malformed file, ...).
    #[error("{0}")]
    Config(String),

    /// A value that could not be interpreted, typically during a bulk import.
    #[error("{0}")]
    ValueInterpretation(Interpretation),

    /// A configuration setting with an unacceptable value.
    #[error("{0}")]
    ConfigSetting(Interpretation),

    /// A bad value supplied by the user.
    #[error("{0}")]
    Value(String),

    /// An index or position out of range.
    #[error("{0}")]
    Index(String),

    /// A file that should exist does not.
    #[error("{message}")]
    FileNotFound {
        /// Human-readable description, usually naming the path.
        message: String,
        /// Underlying I/O error, when there was one.
        source: Option<io::Error>,
    },

    /// A file that should not exist does.
    #[error("{message}")]
    FileExists {
        /// Human-readable description, usually naming the path.
        message: String,
        /// Underlying I/O error, when there was one.
        source: Option<io::Error>,
    },

    /// A path that should be a directory is not.
    #[error("{message}")]
    NotADirectory {
        /// Human-readable description, usually naming the path.
        message: String,
        /// Underlying I/O error, when there was one.
        source: Option<io::Error>,
    },
}

impl ErrorKind {
    /// Suggested exit code for this kind.
    #[must_use]
    pub const fn exit_code(&self) -> SysExit {
        match self {
            Self::Warning(_) | Self::ValueInterpretation(_) | Self::ConfigSetting(_) => {
                SysExit::Warning
            }
            Self::Config(_) => SysExit::Config,
            Self::Value(_) | Self::Index(_) => SysExit::Usage,
            Self::Error(_)
            | Self::FileNotFound { .. }
            | Self::FileExists { .. }
            | Self::NotADirectory { .. } => SysExit::Error,
        }
    }

    /// Severity used when none is given at construction.
    #[must_use]
    pub const fn default_log_level(&self) -> Severity {
        if self.is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// `true` for the warning family.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::Warning(_) | Self::ValueInterpretation(_) | Self::ConfigSetting(_)
        )
    }

    /// Stable name of the kind, for log prefixes and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Error(_) => "Error",
            Self::Warning(_) => "Warning",
            Self::Config(_) => "ConfigError",
            Self::ValueInterpretation(_) => "ValueInterpretationWarning",
            Self::ConfigSetting(_) => "ConfigSettingWarning",
            Self::Value(_) => "ValueError",
            Self::Index(_) => "IndexError",
            Self::FileNotFound { .. } => "FileNotFoundError",
            Self::FileExists { .. } => "FileExistsError",
            Self::NotADirectory { .. } => "NotADirectoryError",
        }
    }
}

/// An error kind together with the severity it should be logged at.
///
/// # Examples
///
/// ```
/// use gwcore::error::{GwError, SysExit};
/// use gwcore::logging::Severity;
///
/// let err = GwError::config("bad").with_log_level(Severity::Critical);
/// assert_eq!(err.exit_code(), SysExit::Config);
/// assert_eq!(err.log_level(), Severity::Critical);
/// assert_eq!(err.to_string(), "bad");
/// ```
#[derive(Debug)]
pub struct GwError {
    kind: ErrorKind,
    log_level: Severity,
}

impl GwError {
    /// Wrap `kind` with its default severity.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        let log_level = kind.default_log_level();
        Self { kind, log_level }
    }

    /// Generic error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error(message.into()))
    }

    /// Generic warning.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Warning(message.into()))
    }

    /// Configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(message.into()))
    }

    /// Value that could not be interpreted.
    #[must_use]
    pub const fn value_interpretation(parts: Interpretation) -> Self {
        Self::new(ErrorKind::ValueInterpretation(parts))
    }

    /// Configuration setting with an unacceptable value.
    #[must_use]
    pub const fn config_setting(parts: Interpretation) -> Self {
        Self::new(ErrorKind::ConfigSetting(parts))
    }

    /// Bad value.
    #[must_use]
    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value(message.into()))
    }

    /// Index out of range.
    #[must_use]
    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index(message.into()))
    }

    /// Missing file.
    #[must_use]
    pub fn file_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileNotFound {
            message: message.into(),
            source: None,
        })
    }

    /// File already present.
    #[must_use]
    pub fn file_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileExists {
            message: message.into(),
            source: None,
        })
    }

    /// Path is not a directory.
    #[must_use]
    pub fn not_a_directory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotADirectory {
            message: message.into(),
            source: None,
        })
    }

    /// Mirror a platform I/O error that concerns `path`.
    ///
    /// `NotFound`, `AlreadyExists` and `NotADirectory` map onto the matching
    /// file kinds; anything else becomes a generic error. The I/O error stays
    /// reachable through [`StdError::source`] except for the generic case,
    /// where it is folded into the message.
    #[must_use]
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let message = format!("{}: {err}", path.display());
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound {
                message,
                source: Some(err),
            },
            io::ErrorKind::AlreadyExists => ErrorKind::FileExists {
                message,
                source: Some(err),
            },
            io::ErrorKind::NotADirectory => ErrorKind::NotADirectory {
                message,
                source: Some(err),
            },
            _ => ErrorKind::Error(message),
        };
        Self::new(kind)
    }

    /// Override the severity this error is logged at.
    #[must_use]
    pub const fn with_log_level(mut self, log_level: Severity) -> Self {
        self.log_level = log_level;
        self
    }

    /// The kind of error.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Severity to log this error at.
    #[must_use]
    pub const fn log_level(&self) -> Severity {
        self.log_level
    }

    /// Suggested process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> SysExit {
        self.kind.exit_code()
    }

    /// `true` for the warning family.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }

    /// Find the first [`GwError`] in `err`'s source chain, starting with `err` itself.
    #[must_use]
    pub fn find_in_chain<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Self> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(found) = e.downcast_ref::<Self>() {
                return Some(found);
            }
            current = e.source();
        }
        None
    }
}

impl From<ErrorKind> for GwError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for GwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl StdError for GwError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.kind.source()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn every_kind() -> Vec<GwError> {
        vec![
            GwError::error("e"),
            GwError::warning("w"),
            GwError::config("c"),
            GwError::value_interpretation(Interpretation::new("k", "v")),
            GwError::config_setting(Interpretation::new("k", "v")),
            GwError::value("v"),
            GwError::index("i"),
            GwError::file_not_found("f"),
            GwError::file_exists("f"),
            GwError::not_a_directory("d"),
        ]
    }

    // -----------------------------------------------------------------------
    // Defaults per kind
    // -----------------------------------------------------------------------

    #[test]
    fn exit_codes_per_kind() {
        let codes: Vec<u8> = every_kind().iter().map(|e| e.exit_code().code()).collect();
        assert_eq!(codes, vec![2, 1, 78, 1, 1, 64, 64, 2, 2, 2]);
    }

    #[test]
    fn exit_codes_are_sysexits() {
        for err in every_kind() {
            assert!(
                SysExit::ALL.contains(&err.exit_code()),
                "{} has an exit code outside the sysexits subset",
                err.kind().name()
            );
        }
    }

    #[test]
    fn default_log_levels() {
        assert_eq!(GwError::error("x").log_level(), Severity::Error);
        assert_eq!(GwError::warning("x").log_level(), Severity::Warning);
        assert_eq!(GwError::config("x").log_level(), Severity::Error);
        assert_eq!(
            GwError::config_setting(Interpretation::new("k", "v")).log_level(),
            Severity::Warning
        );
        assert_eq!(GwError::value("x").log_level(), Severity::Error);
        assert_eq!(GwError::file_not_found("x").log_level(), Severity::Error);
    }

    #[test]
    fn log_level_override() {
        let err = GwError::config("bad").with_log_level(Severity::Critical);
        assert_eq!(err.log_level(), Severity::Critical);
        assert_eq!(err.exit_code(), SysExit::Config, "override keeps the exit code");
    }

    #[test]
    fn warning_family() {
        assert!(GwError::warning("x").is_warning());
        assert!(GwError::value_interpretation(Interpretation::new("k", "v")).is_warning());
        assert!(!GwError::config("x").is_warning());
    }

    // -----------------------------------------------------------------------
    // Interpretation messages
    // -----------------------------------------------------------------------

    #[test]
    fn interpretation_plain() {
        let e = GwError::value_interpretation(Interpretation::new("width", "wide"));
        assert_eq!(e.to_string(), "width = wide is invalid.");
    }

    #[test]
    fn interpretation_with_possible_values() {
        let e = GwError::config_setting(
            Interpretation::new("color", "mauve").with_possible_values("red, green, blue"),
        );
        assert_eq!(
            e.to_string(),
            "color = mauve is invalid. Possible values are: red, green, blue"
        );
    }

    #[test]
    fn interpretation_with_context() {
        let e = GwError::value_interpretation(
            Interpretation::new("qty", "-1").with_context("row 12"),
        );
        assert_eq!(e.to_string(), "In row 12, qty = -1 is invalid.");
    }

    // -----------------------------------------------------------------------
    // Platform error mirroring
    // -----------------------------------------------------------------------

    #[test]
    fn from_io_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let e = GwError::from_io(io_err, Path::new("/tmp/app.ini"));
        assert!(matches!(e.kind(), ErrorKind::FileNotFound { .. }));
        assert!(e.to_string().contains("/tmp/app.ini"));
        assert!(e.source().is_some());
    }

    #[test]
    fn from_io_already_exists() {
        let io_err = io::Error::new(io::ErrorKind::AlreadyExists, "exists");
        let e = GwError::from_io(io_err, Path::new("out.txt"));
        assert!(matches!(e.kind(), ErrorKind::FileExists { .. }));
        assert_eq!(e.exit_code(), SysExit::Error);
    }

    #[test]
    fn from_io_other_is_generic() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let e = GwError::from_io(io_err, Path::new("locked"));
        assert!(matches!(e.kind(), ErrorKind::Error(_)));
    }

    // -----------------------------------------------------------------------
    // Chain lookup and conversions
    // -----------------------------------------------------------------------

    #[test]
    fn find_in_chain_through_anyhow_context() {
        let err = anyhow::Error::new(GwError::config("bad section"))
            .context("loading settings");
        let found = GwError::find_in_chain(&*err).expect("GwError in chain");
        assert_eq!(found.exit_code(), SysExit::Config);
    }

    #[test]
    fn find_in_chain_none_for_foreign_errors() {
        let err = io::Error::other("plain");
        assert!(GwError::find_in_chain(&err).is_none());
    }

    #[test]
    fn sys_exit_lookup() {
        assert_eq!(SysExit::from_code(78), Some(SysExit::Config));
        assert_eq!(SysExit::from_code(3), None);
        assert!(!SysExit::Warning.is_fatal());
        assert!(SysExit::Error.is_fatal());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_types_are_send_sync() {
        assert_send_sync::<GwError>();
        assert_send_sync::<ErrorKind>();
    }

    #[test]
    fn converts_to_anyhow() {
        let e = GwError::value("bad");
        let _anyhow_err: anyhow::Error = e.into();
    }
}
