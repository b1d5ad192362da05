//! Record sinks attached to loggers: console, rotating file, and in-memory capture.
use std::fmt;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::format::{ConsoleFormat, FileFormat};
use super::level::Severity;
use super::record::Record;

/// A destination for log records.
///
/// A handler only receives records at or above its [`level`](Handler::level);
/// the router checks the level before calling [`emit`](Handler::emit).
/// Emission must not fail loudly: I/O errors are swallowed so that logging
/// never takes the application down.
#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    /// Minimum severity this handler accepts.
    fn level(&self) -> Severity;
    /// Write one record.
    fn emit(&self, record: &Record);
}

/// Writes console-formatted records to stderr (or any writer).
pub struct ConsoleHandler {
    level: Severity,
    format: ConsoleFormat,
    out: Mutex<Box<dyn io::Write + Send>>,
}

impl ConsoleHandler {
    /// A handler writing to stderr.
    #[must_use]
    pub fn stderr(level: Severity, color: bool) -> Self {
        Self::with_writer(level, color, Box::new(io::stderr()))
    }

    /// A handler writing to `out`.
    #[must_use]
    pub fn with_writer(level: Severity, color: bool, out: Box<dyn io::Write + Send>) -> Self {
        Self {
            level,
            format: ConsoleFormat::new(color),
            out: Mutex::new(out),
        }
    }
}

impl fmt::Debug for ConsoleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleHandler")
            .field("level", &self.level)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Handler for ConsoleHandler {
    fn level(&self) -> Severity {
        self.level
    }

    fn emit(&self, record: &Record) {
        let line = self.format.format(record);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}").ok();
        out.flush().ok();
    }
}

#[derive(Debug)]
struct OpenFile {
    file: fs::File,
    size: u64,
}

/// Appends file-formatted records to a file, rolling it over by size.
///
/// Before a write that would take the file to `max_bytes` or beyond, the
/// file is renamed to `<path>.1` (existing backups shift up to
/// `<path>.<rotations>`, the oldest is dropped) and a fresh file is started.
/// With `rotations == 0` or `max_bytes == 0` the file grows without bound.
#[derive(Debug)]
pub struct RotatingFileHandler {
    level: Severity,
    path: PathBuf,
    max_bytes: u64,
    rotations: u32,
    state: Mutex<Option<OpenFile>>,
}

impl RotatingFileHandler {
    /// Open (or create) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(
        path: impl Into<PathBuf>,
        level: Severity,
        max_bytes: u64,
        rotations: u32,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file.metadata().map_or(0, |m| m.len());
        Ok(Self {
            level,
            path,
            max_bytes,
            rotations,
            state: Mutex::new(Some(OpenFile { file, size })),
        })
    }

    /// Path of the active log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `n`th backup (`<path>.<n>`).
    #[must_use]
    pub fn backup_path(&self, n: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn should_roll_over(&self, current: u64, incoming: u64) -> bool {
        self.max_bytes > 0
            && self.rotations > 0
            && current > 0
            && current.saturating_add(incoming) >= self.max_bytes
    }

    fn roll_over(&self, state: &mut Option<OpenFile>) {
        // Close the active file before renaming it.
        *state = None;
        fs::remove_file(self.backup_path(self.rotations)).ok();
        for n in (1..self.rotations).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1)).ok();
            }
        }
        fs::rename(&self.path, self.backup_path(1)).ok();
        *state = open_append(&self.path)
            .ok()
            .map(|file| OpenFile { file, size: 0 });
    }
}

impl Handler for RotatingFileHandler {
    fn level(&self) -> Severity {
        self.level
    }

    fn emit(&self, record: &Record) {
        let line = format!("{}\n", FileFormat.format(record));
        let incoming = u64::try_from(line.len()).unwrap_or(u64::MAX);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.as_ref() {
            None => {
                // A previous roll-over could not reopen the file.
                *state = open_append(&self.path).ok().map(|file| OpenFile {
                    size: file.metadata().map_or(0, |m| m.len()),
                    file,
                });
            }
            Some(open) if self.should_roll_over(open.size, incoming) => {
                self.roll_over(&mut state);
            }
            Some(_) => {}
        }
        if let Some(open) = state.as_mut()
            && open.file.write_all(line.as_bytes()).is_ok()
        {
            open.size += incoming;
        }
    }
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Keeps records in memory.
///
/// Useful in tests and for applications that show recent log lines in
/// their own UI.
#[derive(Debug)]
pub struct CaptureHandler {
    level: Severity,
    records: Mutex<Vec<Record>>,
}

impl CaptureHandler {
    /// An empty capture accepting records at `level` and above.
    #[must_use]
    pub const fn new(level: Severity) -> Self {
        Self {
            level,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of the captured records, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Forget every captured record.
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Handler for CaptureHandler {
    fn level(&self) -> Severity {
        self.level
    }

    fn emit(&self, record: &Record) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}
