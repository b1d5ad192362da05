//! INI files with typed getters.
//!
//! The grammar is the conventional one:
//!
//! ```ini
//! ; full-line comments start with ';' or '#'
//! [DEFAULT]
//! theme = dark
//!
//! [logging]
//! log_level = DEBUG      # inline comments need a space before them
//! log_file: ~/app.log
//! banner = first line
//!     indented lines continue the previous value
//! ```
//!
//! Keys are case-sensitive. `[DEFAULT]` values are visible from every
//! section. A section that appears twice is merged, later keys winning.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use super::convert::{self, Conversion};
use super::value::{Color, Value};
use crate::error::{GwError, Result};
use crate::logging::Severity;

/// Name of the section whose values every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A parsed `[header]` and its entries, in file order.
///
/// # Examples
///
/// ```
/// use gwcore::config::ini::KvSection;
///
/// let section = KvSection {
///     header: "logging".to_string(),
///     entries: vec![("log_level".to_string(), "DEBUG".to_string())],
/// };
/// assert_eq!(section.get("log_level"), Some("DEBUG"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvSection {
    /// The section name, case preserved.
    pub header: String,
    /// Key-value entries within this section.
    pub entries: Vec<(String, String)>,
}

impl KvSection {
    /// Value of `key` in this section alone.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn upsert(&mut self, key: String, value: String) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

/// Parse INI content into sections, one per header occurrence.
///
/// `origin` names the content in error messages.
///
/// # Examples
///
/// ```
/// use gwcore::config::ini::parse_kv_sections_from_str;
///
/// let sections = parse_kv_sections_from_str(
///     "[window]\nwidth = 800\nheight: 600 ; px\n",
///     "inline",
/// ).unwrap();
/// assert_eq!(sections[0].header, "window");
/// assert_eq!(sections[0].get("height"), Some("600"));
/// ```
///
/// # Errors
///
/// Returns a Config error if:
/// - A line is neither a header, a comment, nor a `key = value` pair
/// - An entry appears outside of a section header
pub fn parse_kv_sections_from_str(content: &str, origin: &str) -> Result<Vec<KvSection>> {
    let mut sections: Vec<KvSection> = Vec::new();
    // Key of the last entry, while continuation lines may still extend it.
    let mut open_key: Option<String> = None;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            open_key = None;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if line.starts_with(char::is_whitespace)
            && let (Some(key), Some(section)) = (open_key.as_ref(), sections.last_mut())
            && let Some(slot) = section.entries.iter_mut().rev().find(|(k, _)| k == key)
        {
            slot.1.push('\n');
            slot.1.push_str(strip_inline_comment(trimmed));
            continue;
        }

        if let Some(header) = parse_raw_header(trimmed) {
            sections.push(KvSection {
                header,
                entries: Vec::new(),
            });
            open_key = None;
        } else if let Some(section) = sections.last_mut() {
            let Some((key, value)) = parse_kv_line(trimmed) else {
                return Err(GwError::config(format!(
                    "{origin}: invalid key-value pair at line {}: {trimmed}",
                    line_num + 1
                )));
            };
            open_key = Some(key.clone());
            section.entries.push((key, value));
        } else {
            return Err(GwError::config(format!(
                "{origin}: entry outside of section at line {}: {trimmed}",
                line_num + 1
            )));
        }
    }

    Ok(sections)
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` or `key: value` line, splitting on whichever
/// separator comes first and stripping inline comments from the value.
///
/// # Examples
///
/// - `"log_level = DEBUG # console"` → `("log_level", "DEBUG")`
/// - `"url: http://host"` → `("url", "http://host")`
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let at = line.find(['=', ':'])?;
    let (key, rest) = line.split_at(at);
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = rest.get(1..).unwrap_or_default();
    Some((
        key.to_string(),
        strip_inline_comment(value.trim()).to_string(),
    ))
}

/// Strip inline comments (`#` or `;` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    [" #", "\t#", " ;", "\t;"]
        .iter()
        .filter_map(|marker| value.find(marker))
        .min()
        .map_or(value, |idx| value.split_at(idx).0.trim_end())
}

/// A set of INI sections, filled from one or more files or strings.
///
/// # Examples
///
/// ```
/// use gwcore::config::ConfigParser;
/// use gwcore::logging::Severity;
///
/// let mut parser = ConfigParser::new();
/// parser.read_str("[logging]\nlog_level = debug\nno_color = yes\n", "inline").unwrap();
///
/// let logging = parser.section("logging").unwrap();
/// assert_eq!(logging.get_severity("log_level").unwrap(), Some(Severity::Debug));
/// assert_eq!(logging.get_bool("no_color"), Some(true));
/// assert_eq!(logging.get_bool("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigParser {
    defaults: KvSection,
    sections: Vec<KvSection>,
    path: Option<PathBuf>,
}

impl ConfigParser {
    /// An empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser loaded from `path`.
    ///
    /// # Errors
    ///
    /// See [`parse_file`](Self::parse_file).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut parser = Self::new();
        parser.parse_file(path)?;
        Ok(parser)
    }

    /// Read `path` (UTF-8) and merge its sections into this parser.
    ///
    /// # Errors
    ///
    /// Returns a Warning if the file does not exist, so callers can fall
    /// back to defaults. Other read failures map through
    /// [`GwError::from_io`]; malformed content is a Config error.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GwError::warning(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| GwError::from_io(e, path))?;
        self.read_str(&content, &path.display().to_string())?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Merge the sections of `content` into this parser.
    ///
    /// # Errors
    ///
    /// Returns a Config error if `content` is malformed; nothing is merged
    /// in that case.
    pub fn read_str(&mut self, content: &str, origin: &str) -> Result<()> {
        for parsed in parse_kv_sections_from_str(content, origin)? {
            let existing = if parsed.header == DEFAULT_SECTION {
                Some(&mut self.defaults)
            } else {
                self.sections.iter_mut().find(|s| s.header == parsed.header)
            };
            if let Some(existing) = existing {
                for (key, value) in parsed.entries {
                    existing.upsert(key, value);
                }
            } else {
                let mut fresh = KvSection {
                    header: parsed.header,
                    entries: Vec::with_capacity(parsed.entries.len()),
                };
                for (key, value) in parsed.entries {
                    fresh.upsert(key, value);
                }
                self.sections.push(fresh);
            }
        }
        Ok(())
    }

    /// The last file successfully read by [`parse_file`](Self::parse_file).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Section names in first-seen order, `DEFAULT` excluded.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.header.as_str()).collect()
    }

    /// Whether `section` exists (`DEFAULT` does not count).
    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.find(section).is_some()
    }

    /// Whether `key` resolves in `section`, defaults included.
    #[must_use]
    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Raw value of `key` in `section`, falling back to `DEFAULT`.
    ///
    /// Returns `None` when the section does not exist.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// A view on one section.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<SectionView<'_>> {
        self.find(name).map(|section| SectionView {
            section,
            defaults: &self.defaults,
        })
    }

    /// Every item visible in `section`, defaults included, as a plain map.
    #[must_use]
    pub fn section_as_dict(&self, section: &str) -> Option<BTreeMap<String, String>> {
        self.section(section).map(|view| view.to_map())
    }

    /// Run `how` on the value of `key` in `section`.
    ///
    /// `Ok(None)` when the key is absent or the converter rejects the value
    /// softly (colors).
    ///
    /// # Errors
    ///
    /// Propagates the converter's error.
    pub fn get_converted(
        &self,
        section: &str,
        key: &str,
        how: Conversion<'_>,
    ) -> Result<Option<Value>> {
        self.get(section, key)
            .map_or(Ok(None), |raw| how.convert(raw))
    }

    /// Text value of `key` in `section`.
    #[must_use]
    pub fn get_text(&self, section: &str, key: &str) -> Option<String> {
        self.section(section)?.get_text(key)
    }

    /// Boolean value of `key` in `section`.
    #[must_use]
    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.section(section)?.get_bool(key)
    }

    /// Integer value of `key` in `section`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value is not an integer.
    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>> {
        self.section(section).map_or(Ok(None), |s| s.get_int(key))
    }

    /// Expanded path value of `key` in `section`.
    #[must_use]
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.section(section)?.get_path(key)
    }

    /// Color value of `key` in `section`; `None` if absent or unparsable.
    #[must_use]
    pub fn get_color(&self, section: &str, key: &str) -> Option<Color> {
        self.section(section)?.get_color(key)
    }

    /// Timestamp value of `key` in `section`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value is not a date/time.
    pub fn get_datetime(&self, section: &str, key: &str) -> Result<Option<NaiveDateTime>> {
        self.section(section)
            .map_or(Ok(None), |s| s.get_datetime(key))
    }

    /// Severity value of `key` in `section`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value names no severity.
    pub fn get_severity(&self, section: &str, key: &str) -> Result<Option<Severity>> {
        self.section(section)
            .map_or(Ok(None), |s| s.get_severity(key))
    }

    fn find(&self, name: &str) -> Option<&KvSection> {
        self.sections.iter().find(|s| s.header == name)
    }
}

/// One section of a [`ConfigParser`], with `DEFAULT` fallback and typed
/// getters.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    section: &'a KvSection,
    defaults: &'a KvSection,
}

impl<'a> SectionView<'a> {
    /// Name of the section.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.section.header
    }

    /// Raw value of `key`, falling back to `DEFAULT`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.section.get(key).or_else(|| self.defaults.get(key))
    }

    /// Keys visible in this section, own keys first, then inherited ones.
    #[must_use]
    pub fn keys(&self) -> Vec<&'a str> {
        let own = self.section.entries.iter().map(|(k, _)| k.as_str());
        let inherited = self
            .defaults
            .entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| self.section.get(k).is_none());
        own.chain(inherited).collect()
    }

    /// Every visible item as a plain map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = self.defaults.entries.iter().cloned().collect();
        map.extend(self.section.entries.iter().cloned());
        map
    }

    /// Text value of `key`.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(convert::as_text)
    }

    /// Boolean value of `key`; see [`as_bool`](convert::as_bool).
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(convert::as_bool)
    }

    /// Integer value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value is not an integer.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get(key).map(convert::as_int).transpose()
    }

    /// Expanded path value of `key`.
    #[must_use]
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(convert::as_path)
    }

    /// Color value of `key`; `None` if absent or unparsable.
    #[must_use]
    pub fn get_color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(convert::as_color)
    }

    /// Color value of `key`, basic HTML color names allowed.
    #[must_use]
    pub fn get_named_color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(convert::as_named_color)
    }

    /// Timestamp value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value is not a date/time.
    pub fn get_datetime(&self, key: &str) -> Result<Option<NaiveDateTime>> {
        self.get(key).map(convert::as_datetime).transpose()
    }

    /// Severity value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a Value error if the value names no severity.
    pub fn get_severity(&self, key: &str) -> Result<Option<Severity>> {
        self.get(key).map(convert::as_severity).transpose()
    }
}
