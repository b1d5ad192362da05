//! The extended severity ladder.
//!
//! Two levels sit between the usual tracing levels: [`Severity::Diagnostic`]
//! ("noisy info for developers", between INFO and DEBUG) and
//! [`Severity::Trace`] (entry/exit breadcrumbs, below DEBUG). Numeric values
//! follow the classic 10-step logging scale so that values read from config
//! files or other tools line up.
use std::fmt;
use std::str::FromStr;

/// A named log severity with a fixed numeric value.
///
/// Ordering follows the numeric value, so `Severity::Trace < Severity::Critical`.
///
/// # Examples
///
/// ```
/// use gwcore::logging::Severity;
///
/// assert_eq!(Severity::Diagnostic.value(), 15);
/// assert_eq!(Severity::from_value(15), Some(Severity::Diagnostic));
/// assert_eq!("diagnostic".parse::<Severity>().ok(), Some(Severity::Diagnostic));
/// assert!(Severity::Trace < Severity::Debug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Entry/exit breadcrumbs (5).
    Trace,
    /// Developer debugging output (10).
    Debug,
    /// Verbose informational output for developers (15).
    Diagnostic,
    /// Normal progress messages (20).
    Info,
    /// Something unexpected that does not stop the run (30).
    Warning,
    /// A failure of the current operation (40).
    Error,
    /// A failure the application cannot recover from (50).
    Critical,
}

impl Severity {
    /// Every level, lowest first.
    pub const ALL: [Self; 7] = [
        Self::Trace,
        Self::Debug,
        Self::Diagnostic,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Width of the longest level name, used for columnar alignment.
    pub const NAME_WIDTH: usize = 10;

    /// Numeric value of the level.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Trace => 5,
            Self::Debug => 10,
            Self::Diagnostic => 15,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// Fixed uppercase spelling of the level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Diagnostic => "DIAGNOSTIC",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Look up a level by its exact numeric value.
    #[must_use]
    pub fn from_value(value: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| u64::from(level.value()) == value)
    }

    /// The `tracing` level used to carry this severity.
    ///
    /// DIAGNOSTIC folds onto INFO and CRITICAL onto ERROR; the exact
    /// severity travels alongside as an event field.
    #[must_use]
    pub const fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Diagnostic | Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Critical => tracing::Level::ERROR,
        }
    }

    /// The severity a plain `tracing` event of `level` is treated as.
    #[must_use]
    pub fn from_tracing(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so that width specifiers like `{:<10}` line columns up.
        f.pad(self.name())
    }
}

/// Error returned when a string names no known severity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}'")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    /// Parse a level name (case-insensitive, `WARN` accepted) or its numeric value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u64>() {
            return Self::from_value(value).ok_or_else(|| UnknownSeverity(s.to_string()));
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "WARN" => Ok(Self::Warning),
            "FATAL" => Ok(Self::Critical),
            upper => Self::ALL
                .into_iter()
                .find(|level| level.name() == upper)
                .ok_or_else(|| UnknownSeverity(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn values_are_fixed() {
        let values: Vec<u8> = Severity::ALL.iter().map(|l| l.value()).collect();
        assert_eq!(values, vec![5, 10, 15, 20, 30, 40, 50]);
    }

    #[test]
    fn members_are_unique() {
        let names: HashSet<&str> = Severity::ALL.iter().map(|l| l.name()).collect();
        let values: HashSet<u8> = Severity::ALL.iter().map(|l| l.value()).collect();
        assert_eq!(names.len(), Severity::ALL.len());
        assert_eq!(values.len(), Severity::ALL.len());
    }

    #[test]
    fn name_round_trips_through_value() {
        for level in Severity::ALL {
            let back = Severity::from_value(u64::from(level.value())).expect("known value");
            assert_eq!(back.name(), level.name());
        }
    }

    #[test]
    fn parse_by_name_and_value() {
        assert_eq!("TRACE".parse::<Severity>().unwrap(), Severity::Trace);
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(" 15 ".parse::<Severity>().unwrap(), Severity::Diagnostic);
        assert!("16".parse::<Severity>().is_err());
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn ordering_follows_value() {
        assert!(Severity::Diagnostic > Severity::Debug);
        assert!(Severity::Diagnostic < Severity::Info);
        assert!(Severity::Trace < Severity::Debug);
        assert_eq!(
            Severity::Info.min(Severity::Debug),
            Severity::Debug,
            "min picks the more verbose level"
        );
    }

    #[test]
    fn display_pads() {
        assert_eq!(format!("{:<10}|", Severity::Info), "INFO      |");
        assert_eq!(Severity::NAME_WIDTH, Severity::Diagnostic.name().len());
    }

    #[test]
    fn tracing_mapping() {
        assert_eq!(Severity::Diagnostic.tracing_level(), tracing::Level::INFO);
        assert_eq!(Severity::Critical.tracing_level(), tracing::Level::ERROR);
        assert_eq!(Severity::from_tracing(tracing::Level::WARN), Severity::Warning);
    }
}
