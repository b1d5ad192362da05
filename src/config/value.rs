//! Typed setting values.
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::logging::Severity;

/// An RGB color with optional alpha, as read from `#RRGGBB[AA]` or
/// `r, g, b[, a]`.
///
/// Displays as a tuple: `(255, 0, 136)` or `(255, 0, 136, 128)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel, when one was given.
    pub alpha: Option<u8>,
}

impl Color {
    /// An opaque color.
    #[must_use]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: None,
        }
    }

    /// A color with an explicit alpha channel.
    #[must_use]
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: Some(alpha),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alpha {
            Some(alpha) => write!(f, "({}, {}, {}, {alpha})", self.red, self.green, self.blue),
            None => write!(f, "({}, {}, {})", self.red, self.green, self.blue),
        }
    }
}

/// A setting or state value.
///
/// # Examples
///
/// ```
/// use gwcore::config::Value;
///
/// let v = Value::from("on");
/// assert_eq!(v.as_str(), Some("on"));
/// assert!(v.is_truthy());
/// assert!(!Value::from(0_i64).is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text.
    Text(String),
    /// A flag.
    Bool(bool),
    /// A whole number.
    Int(i64),
    /// A filesystem path.
    Path(PathBuf),
    /// A color.
    Color(Color),
    /// A local wall-clock timestamp.
    DateTime(NaiveDateTime),
    /// A log severity.
    Severity(Severity),
    /// A list of strings (positional file names).
    List(Vec<String>),
}

impl Value {
    /// Short name of the variant, used in type mismatch messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Path(_) => "path",
            Self::Color(_) => "color",
            Self::DateTime(_) => "datetime",
            Self::Severity(_) => "loglevel",
            Self::List(_) => "list",
        }
    }

    /// The text, if this is a [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The flag, if this is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is a [`Value::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The path, if this is a [`Value::Path`].
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// The color, if this is a [`Value::Color`].
    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The timestamp, if this is a [`Value::DateTime`].
    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// The severity, if this is a [`Value::Severity`].
    #[must_use]
    pub const fn as_severity(&self) -> Option<Severity> {
        match self {
            Self::Severity(s) => Some(*s),
            _ => None,
        }
    }

    /// The items, if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness used when a non-text value meets the `bool` converter:
    /// empty text, empty paths, empty lists, `false` and `0` are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Path(p) => !p.as_os_str().is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Color(_) | Self::DateTime(_) | Self::Severity(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Color(c) => write!(f, "{c}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Severity(s) => f.write_str(s.name()),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Severity> for Value {
    fn from(s: Severity) -> Self {
        Self::Severity(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}
