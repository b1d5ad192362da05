//! Key-normalized value store shared by settings and state.
use std::collections::BTreeMap;

use super::value::Value;

/// Replace each run of `-` and whitespace with a single `_`.
///
/// Idempotent, and case is preserved.
///
/// # Examples
///
/// ```
/// use gwcore::config::normalize_key;
///
/// assert_eq!(normalize_key("log-level"), "log_level");
/// assert_eq!(normalize_key("log - level"), "log_level");
/// assert_eq!(normalize_key(&normalize_key("a -b")), normalize_key("a -b"));
/// ```
#[must_use]
pub fn normalize_key(key: &str) -> String {
    collapse(key, |c| c == '-' || c.is_whitespace())
}

/// Like [`normalize_key`], and `.` also counts as a separator.
///
/// Used for state keys, which are often written as `window.width`.
#[must_use]
pub fn normalize_state_key(key: &str) -> String {
    collapse(key, |c| c == '-' || c == '.' || c.is_whitespace())
}

fn collapse(key: &str, is_separator: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_run = false;
    for c in key.chars() {
        if is_separator(c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// An ordered map from normalized keys to optional values.
///
/// A key mapped to `None` is present but empty: that is what a read of an
/// unknown key leaves behind.
#[derive(Debug, Clone)]
pub struct ConfigRecord {
    values: BTreeMap<String, Option<Value>>,
    normalize: fn(&str) -> String,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self::with_normalizer(normalize_key)
    }
}

impl ConfigRecord {
    /// An empty record using `normalize` for every key.
    #[must_use]
    pub const fn with_normalizer(normalize: fn(&str) -> String) -> Self {
        Self {
            values: BTreeMap::new(),
            normalize,
        }
    }

    /// The normalized form of `key` for this record.
    #[must_use]
    pub fn key(&self, key: &str) -> String {
        (self.normalize)(key)
    }

    /// Read `key`, creating it as empty when it is missing.
    pub fn get(&mut self, key: &str) -> Option<&Value> {
        let key = self.key(key);
        self.values.entry(key).or_insert(None).as_ref()
    }

    /// Read `key` without creating it.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.values.get(&self.key(key)).and_then(Option::as_ref)
    }

    /// Store `value` under `key`.
    pub fn set(&mut self, key: &str, value: Option<Value>) {
        let key = self.key(key);
        self.values.insert(key, value);
    }

    /// Whether `key` is present (possibly empty).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&self.key(key))
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let key = self.key(key);
        self.values.remove(&key).is_some()
    }

    /// Normalized keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of keys, empty ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every key.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
