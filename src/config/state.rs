//! The process-wide state registry, persisted to a small INI-like file.
//!
//! State holds values the application wants back on its next run (window
//! geometry, last opened file, ...). Keys that start with `_` are transient:
//! they live on the same record but are never written out.
//!
//! File shape:
//!
//! ```text
//! [state]
//! window_h=600
//! window_w=800
//! ```
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use super::record::{ConfigRecord, normalize_state_key};
use super::value::Value;
use crate::error::{GwError, Result};

static GLOBAL: LazyLock<Mutex<State>> = LazyLock::new(|| Mutex::new(State::new()));

/// Lock the process-wide state.
///
/// Same discipline as [`settings::global`](super::settings::global).
pub fn global() -> MutexGuard<'static, State> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A record bound to a state file.
///
/// Keys are normalized like settings keys, with `.` also folded to `_`.
///
/// # Examples
///
/// ```
/// use gwcore::config::{State, Value};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("app.state");
/// std::fs::write(&path, "[state]\nwindow.w=800\n").unwrap();
///
/// let mut state = State::new();
/// state.load(&path).unwrap();
/// assert_eq!(state.get("window_w"), Some(&Value::from("800")));
/// ```
#[derive(Debug, Clone)]
pub struct State {
    record: ConfigRecord,
    path: Option<PathBuf>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            record: ConfigRecord::with_normalizer(normalize_state_key),
            path: None,
        }
    }
}

impl State {
    /// An empty, unbound state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The file remembered by [`load`](Self::load).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
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

    /// Store `value` under `key`.
    ///
    /// Values containing line breaks can be held but not saved; see
    /// [`save`](Self::save).
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.record.set(key, Some(value.into()));
    }

    /// Empty `key`.
    pub fn set_none(&mut self, key: &str) {
        self.record.set(key, None);
    }

    /// Whether `key` is present, empty or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.record.contains(key)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.record.remove(key)
    }

    /// Normalized keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.record.keys()
    }

    /// Drop every key; the remembered path is kept.
    pub fn clear(&mut self) {
        self.record.clear();
    }

    /// Remember `path` and merge its `key=value` lines into the record.
    ///
    /// `[header]` lines are ignored, and so is any line without `=`. Keys
    /// and values are trimmed; values are stored as text.
    ///
    /// # Errors
    ///
    /// Returns a Warning if the file does not exist (the path is still
    /// remembered, so a later [`save`](Self::save) creates it). Other read
    /// failures map through [`GwError::from_io`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.path = Some(path.to_path_buf());
        if !path.exists() {
            return Err(GwError::warning(format!(
                "state file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| GwError::from_io(e, path))?;
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                continue;
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    self.record.set(key, Some(Value::from(value.trim())));
                }
            }
        }
        Ok(())
    }

    /// Overwrite the remembered file with `[heading]` and one `key=value`
    /// line per persistable key, sorted.
    ///
    /// Keys starting with `_` and empty keys are not written.
    ///
    /// # Errors
    ///
    /// - Config error if [`load`](Self::load) was never called.
    /// - Value error if a persistable key or value contains a line break,
    ///   since it would read back as extra keys; the file is left untouched.
    /// - Warning if nothing is persistable; the file is left untouched.
    /// - The mapped I/O error if writing fails.
    pub fn save(&self, heading: &str) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| GwError::config("state file path unknown: load() was never called"))?;

        let mut body = String::new();
        for (key, value) in self.record.iter() {
            if key.starts_with('_') {
                continue;
            }
            if let Some(value) = value {
                let line = format!("{key}={value}");
                if line.contains(['\n', '\r']) {
                    return Err(GwError::value(format!(
                        "state key {key:?} holds a line break and cannot be saved"
                    )));
                }
                let _ = writeln!(body, "{line}");
            }
        }
        if body.is_empty() {
            return Err(GwError::warning("no state to save"));
        }
        fs::write(path, format!("[{heading}]\n{body}")).map_err(|e| GwError::from_io(e, path))
    }
}
