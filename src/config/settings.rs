//! The process-wide settings registry.
//!
//! Settings are layered by call order rather than by a priority table: the
//! application first latches command-line values with
//! [`Settings::update_as_immutable`], then imports INI values with
//! [`Settings::import_setting`]. Imports never override a latched key, so
//! the command line wins.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use super::convert::{self, Conversion, Converter};
use super::ini::ConfigParser;
use super::record::{ConfigRecord, normalize_key};
use super::value::Value;
use crate::error::{GwError, Interpretation, Result};
use crate::logging::Severity;

static GLOBAL: LazyLock<Mutex<Settings>> = LazyLock::new(|| Mutex::new(Settings::new()));

/// Lock the process-wide settings.
///
/// The guard must not be held across another call to `global()` on the
/// same thread. Writers are expected to finish (typically during start-up)
/// before other threads read.
pub fn global() -> MutexGuard<'static, Settings> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A source of `(key, value)` pairs for [`Settings::update_as_immutable`].
pub trait SettingsSource {
    /// Every entry; `None` values are skipped by the importer.
    fn setting_entries(&self) -> Vec<(String, Option<Value>)>;
}

impl SettingsSource for BTreeMap<String, Option<Value>> {
    fn setting_entries(&self) -> Vec<(String, Option<Value>)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl SettingsSource for BTreeMap<String, Value> {
    fn setting_entries(&self) -> Vec<(String, Option<Value>)> {
        self.iter()
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect()
    }
}

impl SettingsSource for [(&str, Option<Value>)] {
    fn setting_entries(&self) -> Vec<(String, Option<Value>)> {
        self.iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }
}

/// One entry of a bulk [`Settings::import_settings`] call.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Key to read from the section and to store under (normalized).
    pub name: String,
    /// INI section to read from.
    pub section: String,
    /// Value stored when the key is absent.
    pub default: Option<Value>,
    /// Converter applied to the raw text.
    pub converter: Converter,
}

impl ImportSpec {
    /// Import `name` from `section` as text with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            default: None,
            converter: Converter::Text,
        }
    }

    /// Use `converter` instead of `text`.
    #[must_use]
    pub const fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Store `default` when the key is absent.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The settings record: normalized keys, auto-created on read, with a set
/// of immutable keys that silently ignore writes.
///
/// # Examples
///
/// ```
/// use gwcore::config::{Settings, Value};
///
/// let mut settings = Settings::new();
/// assert_eq!(settings.get("window-title"), None);
/// assert!(settings.contains("window_title"));
///
/// settings.update_as_immutable(&[("theme", Some(Value::from("dark")))][..]);
/// assert!(!settings.set("theme", "light"));
/// assert_eq!(settings.get_str("theme").as_deref(), Some("dark"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Settings {
    record: ConfigRecord,
    immutables: BTreeSet<String>,
    parser: Option<ConfigParser>,
}

impl Settings {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `key`, creating it as empty when missing.
    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// Read `key` without creating it.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.record.peek(key)
    }

    /// Store `value` under `key` unless the key is immutable.
    ///
    /// Returns whether the write happened.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        self.set_value(key, Some(value.into()))
    }

    /// Empty `key` unless it is immutable.
    pub fn set_none(&mut self, key: &str) -> bool {
        self.set_value(key, None)
    }

    /// Store `value` (or emptiness) under `key` unless the key is immutable.
    pub fn set_value(&mut self, key: &str, value: Option<Value>) -> bool {
        if self.is_immutable(key) {
            return false;
        }
        self.record.set(key, value);
        true
    }

    /// Whether `key` is present, empty or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.record.contains(key)
    }

    /// Remove `key` unless it is immutable. Returns whether it was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        !self.is_immutable(key) && self.record.remove(key)
    }

    /// Whether writes to `key` are ignored.
    #[must_use]
    pub fn is_immutable(&self, key: &str) -> bool {
        self.immutables.contains(&self.record.key(key))
    }

    /// The immutable keys, normalized and sorted.
    pub fn immutables(&self) -> impl Iterator<Item = &str> {
        self.immutables.iter().map(String::as_str)
    }

    /// Normalized keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.record.keys()
    }

    /// Assign every non-`None` entry of `source` and latch it immutable.
    ///
    /// A key that is already immutable keeps its first value.
    pub fn update_as_immutable<S: SettingsSource + ?Sized>(&mut self, source: &S) {
        for (key, value) in source.setting_entries() {
            let Some(value) = value else { continue };
            if self.set_value(&key, Some(value)) {
                self.immutables.insert(self.record.key(&key));
            }
        }
    }

    /// Remember `parser` for later [`import_setting`](Self::import_setting)
    /// calls.
    pub fn bind_parser(&mut self, parser: ConfigParser) {
        self.parser = Some(parser);
    }

    /// The parser bound with [`bind_parser`](Self::bind_parser).
    #[must_use]
    pub const fn parser(&self) -> Option<&ConfigParser> {
        self.parser.as_ref()
    }

    /// Import `names` from `section` of the bound parser.
    ///
    /// For each name: if the section has a value (an empty value counts),
    /// it is converted with `how` and stored under the normalized name;
    /// otherwise `default` is stored when it is `Some`. Immutable keys are
    /// skipped entirely, so a latched command-line value wins.
    ///
    /// # Errors
    ///
    /// Returns a Config error if no parser is bound, or the converter's
    /// error for the first value that fails to convert.
    pub fn import_setting(
        &mut self,
        names: &[&str],
        section: &str,
        default: Option<Value>,
        how: Conversion<'_>,
    ) -> Result<()> {
        let parser = self
            .parser
            .take()
            .ok_or_else(|| GwError::config("no config parser bound to the settings"))?;
        let result = self.import_setting_from(&parser, names, section, default, how);
        self.parser = Some(parser);
        result
    }

    /// Like [`import_setting`](Self::import_setting) with an explicit parser.
    ///
    /// # Errors
    ///
    /// Returns the converter's error for the first value that fails.
    pub fn import_setting_from(
        &mut self,
        parser: &ConfigParser,
        names: &[&str],
        section: &str,
        default: Option<Value>,
        how: Conversion<'_>,
    ) -> Result<()> {
        for name in names {
            if self.is_immutable(name) {
                continue;
            }
            match lookup(parser, section, name) {
                Some(raw) => {
                    let value = how.convert(raw)?;
                    self.set_value(name, value);
                }
                None => {
                    if default.is_some() {
                        self.set_value(name, default.clone());
                    }
                }
            }
        }
        Ok(())
    }

    /// Import several settings from the bound parser, collecting conversion
    /// failures instead of stopping at the first one.
    ///
    /// A failed entry keeps its previous value and contributes one
    /// ValueInterpretation warning to the returned list.
    ///
    /// # Errors
    ///
    /// Returns a Config error if no parser is bound.
    pub fn import_settings(&mut self, specs: &[ImportSpec]) -> Result<Vec<GwError>> {
        let parser = self
            .parser
            .take()
            .ok_or_else(|| GwError::config("no config parser bound to the settings"))?;
        let mut warnings = Vec::new();
        for spec in specs {
            let imported = self.import_setting_from(
                &parser,
                &[spec.name.as_str()],
                &spec.section,
                spec.default.clone(),
                spec.converter.into(),
            );
            if let Err(err) = imported {
                let raw = lookup(&parser, &spec.section, &spec.name).unwrap_or_default();
                crate::logging::Logger::get("gwcore.settings")
                    .debug(format_args!("import of {:?} failed: {err}", spec.name));
                warnings.push(GwError::value_interpretation(
                    Interpretation::new(&spec.name, raw)
                        .with_context(format!("[{}]", spec.section)),
                ));
            }
        }
        self.parser = Some(parser);
        Ok(warnings)
    }

    /// Sorted `key = value` lines, `None` for empty keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use gwcore::config::Settings;
    ///
    /// let mut settings = Settings::new();
    /// settings.set("b", 2_i64);
    /// settings.set("a", "one");
    /// settings.set_none("c");
    /// assert_eq!(settings.dump(), "a = one\nb = 2\nc = None\n");
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.record.iter() {
            match value {
                Some(value) => {
                    let _ = writeln!(out, "{key} = {value}");
                }
                None => {
                    let _ = writeln!(out, "{key} = None");
                }
            }
        }
        out
    }

    /// Forget every key, every immutable mark and the bound parser.
    pub fn reset(&mut self) {
        self.record.clear();
        self.immutables.clear();
        self.parser = None;
    }

    /// `key` as text. Paths and severities are rendered.
    pub fn get_str(&mut self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Text(s) => Some(s.clone()),
            Value::Path(p) => Some(p.display().to_string()),
            Value::Severity(s) => Some(s.name().to_string()),
            _ => None,
        }
    }

    /// `key` as a flag. Text goes through the `bool` converter and other
    /// values through [`Value::is_truthy`]; empty keys are `None`.
    pub fn get_bool(&mut self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Text(s) => Some(convert::as_bool(s)),
            other => Some(other.is_truthy()),
        }
    }

    /// `key` as a severity. Text is parsed; unparsable text is `None`.
    pub fn get_severity(&mut self, key: &str) -> Option<Severity> {
        match self.get(key)? {
            Value::Severity(s) => Some(*s),
            Value::Text(s) => convert::as_severity(s).ok(),
            _ => None,
        }
    }

    /// `key` as a path. Text is expanded like the `path` converter.
    pub fn get_path(&mut self, key: &str) -> Option<std::path::PathBuf> {
        match self.get(key)? {
            Value::Path(p) => Some(p.clone()),
            Value::Text(s) => Some(convert::as_path(s)),
            _ => None,
        }
    }
}

/// Raw value of `name` in `section`: the exact key first, then any key
/// that normalizes to the same spelling.
fn lookup<'a>(parser: &'a ConfigParser, section: &str, name: &str) -> Option<&'a str> {
    let view = parser.section(section)?;
    view.get(name).or_else(|| {
        let wanted = normalize_key(name);
        view.keys()
            .into_iter()
            .find(|key| normalize_key(key) == wanted)
            .and_then(|key| view.get(key))
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Color;
    use crate::error::ErrorKind;

    fn bound(content: &str) -> Settings {
        let mut parser = ConfigParser::new();
        parser.read_str(content, "test").unwrap();
        let mut settings = Settings::new();
        settings.bind_parser(parser);
        settings
    }

    // ------------------------------------------------------------------
    // record behavior
    // ------------------------------------------------------------------

    #[test]
    fn reads_auto_create() {
        let mut settings = Settings::new();
        assert!(!settings.contains("unused"));
        assert_eq!(settings.get("unused"), None);
        assert!(settings.contains("unused"));
    }

    #[test]
    fn normalization_applies_everywhere() {
        let mut settings = Settings::new();
        settings.set("log-file", "a.log");
        assert_eq!(settings.peek("log file"), settings.peek("log_file"));
        assert!(settings.contains("log - file"));
        assert!(settings.remove("log-file"));
        assert!(!settings.contains("log_file"));
    }

    #[test]
    fn immutable_latch_ignores_writes() {
        let mut settings = Settings::new();
        settings.update_as_immutable(&[("dev-mode", Some(Value::Bool(true)))][..]);
        assert!(settings.is_immutable("dev_mode"));
        assert!(!settings.set("dev_mode", false));
        assert!(!settings.set_none("dev mode"));
        assert!(!settings.remove("dev-mode"));
        assert_eq!(settings.peek("dev_mode"), Some(&Value::Bool(true)));
    }

    #[test]
    fn update_as_immutable_skips_none() {
        let mut source = BTreeMap::new();
        source.insert("log_file".to_string(), None);
        source.insert("recurse".to_string(), Some(Value::Bool(false)));
        let mut settings = Settings::new();
        settings.update_as_immutable(&source);
        assert!(!settings.is_immutable("log_file"));
        assert!(!settings.contains("log_file"));
        assert!(settings.is_immutable("recurse"));
        assert!(settings.set("log_file", "x.log"));
    }

    #[test]
    fn first_immutable_value_wins() {
        let mut settings = Settings::new();
        settings.update_as_immutable(&[("k", Some(Value::from("first")))][..]);
        settings.update_as_immutable(&[("k", Some(Value::from("second")))][..]);
        assert_eq!(settings.peek("k"), Some(&Value::from("first")));
    }

    // ------------------------------------------------------------------
    // imports
    // ------------------------------------------------------------------

    #[test]
    fn import_converts_present_value() {
        let mut settings = bound("[ui]\naccent = #FF0088\n");
        settings
            .import_setting(&["accent"], "ui", None, Converter::Color.into())
            .unwrap();
        assert_eq!(
            settings.peek("accent"),
            Some(&Value::Color(Color::rgb(255, 0, 136)))
        );
    }

    #[test]
    fn import_uses_default_when_absent() {
        let mut settings = bound("[ui]\n");
        settings
            .import_setting(&["theme", "font"], "ui", Some(Value::from("plain")), Conversion::default())
            .unwrap();
        assert_eq!(settings.peek("theme"), Some(&Value::from("plain")));
        assert_eq!(settings.peek("font"), Some(&Value::from("plain")));
    }

    #[test]
    fn import_without_default_leaves_key_alone() {
        let mut settings = bound("[ui]\n");
        settings
            .import_setting(&["theme"], "ui", None, Conversion::default())
            .unwrap();
        assert!(!settings.contains("theme"));
    }

    #[test]
    fn import_treats_empty_value_as_present() {
        let mut settings = bound("[ui]\ntitle =\n");
        settings
            .import_setting(&["title"], "ui", Some(Value::from("fallback")), Conversion::default())
            .unwrap();
        assert_eq!(settings.peek("title"), Some(&Value::from("")));
    }

    #[test]
    fn import_matches_normalized_ini_keys() {
        let mut settings = bound("[logging]\nlog-level = debug\n");
        settings
            .import_setting(&["log_level"], "logging", None, Converter::Severity.into())
            .unwrap();
        assert_eq!(settings.get_severity("log_level"), Some(Severity::Debug));
    }

    #[test]
    fn import_never_overrides_immutables() {
        let mut settings = bound("[logging]\nlog_level = INFO\n");
        settings.update_as_immutable(&[("log_level", Some(Value::Severity(Severity::Debug)))][..]);
        settings
            .import_setting(
                &["log_level"],
                "logging",
                Some(Value::Severity(Severity::Info)),
                Converter::Severity.into(),
            )
            .unwrap();
        assert_eq!(settings.get_severity("log_level"), Some(Severity::Debug));
    }

    #[test]
    fn import_with_custom_function() {
        let mut settings = bound("[s]\nname = ada\n");
        let shout = |raw: &str| Ok(Some(Value::Text(raw.to_uppercase())));
        settings
            .import_setting(&["name"], "s", None, Conversion::Custom(&shout))
            .unwrap();
        assert_eq!(settings.get_str("name").as_deref(), Some("ADA"));
    }

    #[test]
    fn import_without_parser_is_config_error() {
        let mut settings = Settings::new();
        let err = settings
            .import_setting(&["x"], "s", None, Conversion::default())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn import_conversion_failure_propagates() {
        let mut settings = bound("[s]\ncount = many\n");
        let err = settings
            .import_setting(&["count"], "s", None, Converter::Int.into())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Value(_)));
        assert!(settings.parser().is_some(), "parser stays bound after a failure");
    }

    #[test]
    fn bulk_import_collects_warnings() {
        let mut settings = bound("[s]\ncount = many\nlevel = debug\nwhen = soon\n");
        let warnings = settings
            .import_settings(&[
                ImportSpec::new("count", "s").with_converter(Converter::Int),
                ImportSpec::new("level", "s").with_converter(Converter::Severity),
                ImportSpec::new("when", "s").with_converter(Converter::DateTime),
                ImportSpec::new("missing", "s").with_default(3_i64),
            ])
            .unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(GwError::is_warning));
        assert_eq!(warnings[0].to_string(), "In [s], count = many is invalid.");
        assert_eq!(settings.get_severity("level"), Some(Severity::Debug));
        assert_eq!(settings.peek("missing"), Some(&Value::Int(3)));
        assert!(!settings.contains("count"));
    }

    // ------------------------------------------------------------------
    // dump / reset / typed helpers
    // ------------------------------------------------------------------

    #[test]
    fn dump_is_sorted_and_stable() {
        let mut settings = Settings::new();
        settings.set("zeta", true);
        settings.set("alpha", Severity::Warning);
        settings.get("middle");
        insta::assert_snapshot!(settings.dump(), @r"
        alpha = WARNING
        middle = None
        zeta = true
        ");
    }

    #[test]
    fn reset_clears_everything() {
        let mut settings = bound("[s]\n");
        settings.update_as_immutable(&[("k", Some(Value::from("v")))][..]);
        settings.reset();
        assert!(settings.keys().next().is_none());
        assert!(settings.immutables().next().is_none());
        assert!(settings.parser().is_none());
        assert!(settings.set("k", "w"));
    }

    #[test]
    fn typed_helpers_coerce_text() {
        let mut settings = Settings::new();
        settings.set("flag", "Yes");
        settings.set("level", "trace");
        settings.set("count", 0_i64);
        assert_eq!(settings.get_bool("flag"), Some(true));
        assert_eq!(settings.get_bool("count"), Some(false));
        assert_eq!(settings.get_severity("level"), Some(Severity::Trace));
        assert_eq!(settings.get_bool("absent"), None);
        assert_eq!(settings.get_str("count"), None);
    }

    #[test]
    fn global_is_shared() {
        global().set("settings_tests_global_marker", true);
        assert_eq!(
            global().peek("settings_tests_global_marker"),
            Some(&Value::Bool(true))
        );
    }
}
