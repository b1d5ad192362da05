//! Named converters from raw INI text to typed [`Value`]s.
//!
//! Each converter is available as a plain function (`as_bool`, `as_color`,
//! ...) and by name through [`Converter`], so settings imports can pick a
//! converter from data.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

use super::value::{Color, Value};
use crate::error::{GwError, Result};
use crate::logging::Severity;

/// Spellings accepted as true by [`as_bool`], compared case-insensitively.
pub const TRUE_WORDS: [&str; 6] = ["1", "true", "t", "yes", "y", "on"];

/// Naive timestamp layouts tried by [`as_datetime`], most specific first.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// The sixteen basic HTML color names understood by [`as_named_color`].
const NAMED_COLORS: [(&str, Color); 16] = [
    ("black", Color::rgb(0, 0, 0)),
    ("silver", Color::rgb(192, 192, 192)),
    ("gray", Color::rgb(128, 128, 128)),
    ("white", Color::rgb(255, 255, 255)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("red", Color::rgb(255, 0, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("navy", Color::rgb(0, 0, 128)),
    ("blue", Color::rgb(0, 0, 255)),
    ("teal", Color::rgb(0, 128, 128)),
    ("aqua", Color::rgb(0, 255, 255)),
];

/// The text unchanged.
#[must_use]
pub fn as_text(raw: &str) -> String {
    raw.to_string()
}

/// True iff `raw` is one of [`TRUE_WORDS`], ignoring case and surrounding
/// whitespace. Anything else, including the empty string, is false.
///
/// # Examples
///
/// ```
/// use gwcore::config::as_bool;
///
/// assert!(as_bool("YES"));
/// assert!(as_bool("on"));
/// assert!(!as_bool("maybe"));
/// ```
#[must_use]
pub fn as_bool(raw: &str) -> bool {
    let folded = raw.trim().to_lowercase();
    TRUE_WORDS.contains(&folded.as_str())
}

/// Expand a leading `~` and any `$VAR` / `${VAR}` references.
///
/// Unknown variables are left as written.
#[must_use]
pub fn as_path(raw: &str) -> PathBuf {
    let expanded = expand_vars(raw.trim());
    PathBuf::from(expand_home(&expanded))
}

fn expand_home(path: &str) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return path.to_string();
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return path.to_string();
    }
    dirs::home_dir().map_or_else(
        || path.to_string(),
        |home| format!("{}{rest}", home.display()),
    )
}

fn expand_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        let (before, from_dollar) = rest.split_at(pos);
        out.push_str(before);
        let after = from_dollar.get(1..).unwrap_or_default();

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (braced.get(..end).unwrap_or_default(), end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (after.get(..end).unwrap_or_default(), end)
        };

        let literal = from_dollar.get(..=consumed).unwrap_or(from_dollar);
        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(literal),
        }
        rest = from_dollar.get(consumed + 1..).unwrap_or_default();
    }
    out.push_str(rest);
    out
}

/// Parse `#RRGGBB[AA]`, `RRGGBB[AA]` or `r, g, b[, a]` (optionally in
/// parentheses). Anything else yields `None`.
///
/// # Examples
///
/// ```
/// use gwcore::config::{Color, as_color};
///
/// assert_eq!(as_color("#FF0088"), Some(Color::rgb(255, 0, 136)));
/// assert_eq!(as_color("(255, 0, 136)"), Some(Color::rgb(255, 0, 136)));
/// assert_eq!(as_color("garbage"), None);
/// ```
#[must_use]
pub fn as_color(raw: &str) -> Option<Color> {
    let trimmed = raw.trim();
    if trimmed.contains(',') {
        return parse_color_tuple(trimmed);
    }
    parse_color_hex(trimmed.strip_prefix('#').unwrap_or(trimmed))
}

/// Like [`as_color`], and also accepts the sixteen basic HTML color names.
#[must_use]
pub fn as_named_color(raw: &str) -> Option<Color> {
    let folded = raw.trim().to_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == folded)
        .map(|(_, color)| *color)
        .or_else(|| as_color(raw))
}

fn parse_color_hex(hex: &str) -> Option<Color> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |at: usize| {
        hex.get(at..at + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    let (red, green, blue) = (channel(0)?, channel(2)?, channel(4)?);
    if hex.len() == 8 {
        Some(Color::rgba(red, green, blue, channel(6)?))
    } else {
        Some(Color::rgb(red, green, blue))
    }
}

fn parse_color_tuple(text: &str) -> Option<Color> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    let channels = inner
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    match channels.as_slice() {
        [red, green, blue] => Some(Color::rgb(*red, *green, *blue)),
        [red, green, blue, alpha] => Some(Color::rgba(*red, *green, *blue, *alpha)),
        _ => None,
    }
}

/// Parse an ISO-like timestamp, an RFC 3339 timestamp (converted to local
/// time), a bare date (midnight), or unix-epoch seconds (local time).
///
/// # Errors
///
/// Returns a Value error if none of the forms match.
pub fn as_datetime(raw: &str) -> Result<NaiveDateTime> {
    let text = raw.trim();
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    parse_epoch(text).ok_or_else(|| GwError::value(format!("not a date/time: {raw:?}")))
}

fn parse_epoch(text: &str) -> Option<NaiveDateTime> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let mut secs: i64 = whole.parse().ok()?;
    let mut nanos = 0_u32;
    if !fraction.is_empty() {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        nanos = digits.parse().ok()?;
        if whole.starts_with('-') && nanos > 0 {
            secs = secs.checked_sub(1)?;
            nanos = 1_000_000_000 - nanos;
        }
    }
    DateTime::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local).naive_local())
}

/// Parse a whole number.
///
/// # Errors
///
/// Returns a Value error if `raw` is not an integer.
pub fn as_int(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| GwError::value(format!("not an integer: {raw:?}")))
}

/// Parse a severity by name (any case) or numeric value.
///
/// # Errors
///
/// Returns a Value error if `raw` names no severity.
pub fn as_severity(raw: &str) -> Result<Severity> {
    raw.parse::<Severity>()
        .map_err(|err| GwError::value(err.to_string()))
}

/// A converter picked by name.
///
/// # Examples
///
/// ```
/// use gwcore::config::{Converter, Value};
///
/// let conv: Converter = "bool".parse().unwrap();
/// assert_eq!(conv.convert("on").unwrap(), Some(Value::Bool(true)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    /// `text`: identity.
    Text,
    /// `bool`: see [`as_bool`].
    Bool,
    /// `int`: see [`as_int`].
    Int,
    /// `path`: see [`as_path`].
    Path,
    /// `color`: see [`as_color`].
    Color,
    /// `namedcolor`: see [`as_named_color`].
    NamedColor,
    /// `datetime`: see [`as_datetime`].
    DateTime,
    /// `loglevel`: see [`as_severity`].
    Severity,
}

impl Converter {
    /// Every converter.
    pub const ALL: [Self; 8] = [
        Self::Text,
        Self::Bool,
        Self::Int,
        Self::Path,
        Self::Color,
        Self::NamedColor,
        Self::DateTime,
        Self::Severity,
    ];

    /// Name the converter is registered under.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Path => "path",
            Self::Color => "color",
            Self::NamedColor => "namedcolor",
            Self::DateTime => "datetime",
            Self::Severity => "loglevel",
        }
    }

    /// Convert `raw`. Color converters yield `Ok(None)` on bad input.
    ///
    /// # Errors
    ///
    /// Returns a Value error when an `int`, `datetime` or `loglevel`
    /// conversion fails.
    pub fn convert(self, raw: &str) -> Result<Option<Value>> {
        Ok(match self {
            Self::Text => Some(Value::Text(as_text(raw))),
            Self::Bool => Some(Value::Bool(as_bool(raw))),
            Self::Int => Some(Value::Int(as_int(raw)?)),
            Self::Path => Some(Value::Path(as_path(raw))),
            Self::Color => as_color(raw).map(Value::Color),
            Self::NamedColor => as_named_color(raw).map(Value::Color),
            Self::DateTime => Some(Value::DateTime(as_datetime(raw)?)),
            Self::Severity => Some(Value::Severity(as_severity(raw)?)),
        })
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Converter {
    type Err = GwError;

    fn from_str(s: &str) -> Result<Self> {
        let folded = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|conv| conv.name() == folded)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.into_iter().map(Self::name).collect();
                GwError::value(format!(
                    "unknown converter {s:?} (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

/// A custom conversion function.
pub type ConvertFn<'a> = &'a dyn Fn(&str) -> Result<Option<Value>>;

/// How an imported setting is converted: a registered converter or a
/// caller-supplied function.
#[derive(Clone, Copy)]
pub enum Conversion<'a> {
    /// A registered converter.
    Named(Converter),
    /// A caller-supplied function.
    Custom(ConvertFn<'a>),
}

impl Conversion<'_> {
    /// Run the conversion.
    ///
    /// # Errors
    ///
    /// Propagates the converter's error.
    pub fn convert(&self, raw: &str) -> Result<Option<Value>> {
        match self {
            Self::Named(conv) => conv.convert(raw),
            Self::Custom(f) => f(raw),
        }
    }
}

impl Default for Conversion<'_> {
    fn default() -> Self {
        Self::Named(Converter::Text)
    }
}

impl From<Converter> for Conversion<'_> {
    fn from(conv: Converter) -> Self {
        Self::Named(conv)
    }
}

impl fmt::Debug for Conversion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(conv) => f.debug_tuple("Named").field(conv).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
