//! Console and file sinks behind a single lock
//!
//! Every accepted line is written to both enabled sinks while holding one
//! mutex, so concurrent callers never interleave partial lines.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::error::LoggerError;
use super::render::RenderedLine;

/// Outcome of writing one line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub file_written: bool,
    pub console_written: bool,
    /// Number of sinks whose write failed
    pub failures: u32,
}

/// Open a log file for create + append, preserving existing content
pub fn open_log_file(path: &Path) -> Result<File, LoggerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggerError::OpenLogFile {
            path: path.to_path_buf(),
            source,
        })
}

struct SinkState {
    file: Option<File>,
    console: Box<dyn Write + Send>,
}

/// Writer that owns the log file handle and the console stream
pub struct DualSink {
    state: Mutex<SinkState>,
    file_path: Option<PathBuf>,
    failures: AtomicU64,
}

impl DualSink {
    /// Create a sink from an already opened file and a console writer
    pub fn new(file: Option<(PathBuf, File)>, console: Box<dyn Write + Send>) -> Self {
        let (file_path, file) = match file {
            Some((path, file)) => (Some(path), Some(file)),
            None => (None, None),
        };
        Self {
            state: Mutex::new(SinkState { file, console }),
            file_path,
            failures: AtomicU64::new(0),
        }
    }

    /// Path of the log file, if one was configured
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Whether the file handle is still held
    pub fn has_file(&self) -> bool {
        self.lock().file.is_some()
    }

    /// Total number of failed sink writes since construction
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        // A caller that panicked mid-write must not disable logging for everyone else
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write a rendered line to the enabled sinks
    ///
    /// Failures are counted and traced but never returned to the caller.
    /// Once the file is closed, file writes are skipped.
    pub fn write(&self, line: &RenderedLine, to_file: bool, to_console: bool) -> WriteReport {
        let mut report = WriteReport::default();
        let mut state = self.lock();

        if to_file {
            if let Some(file) = state.file.as_mut() {
                match file.write_all(line.file_line.as_bytes()) {
                    Ok(()) => report.file_written = true,
                    Err(e) => {
                        report.failures += 1;
                        tracing::warn!(error = %e, path = ?self.file_path, "Failed to write log file");
                    }
                }
            }
        }

        if to_console {
            let console = &mut state.console;
            let result = console
                .write_all(line.console_line.as_bytes())
                .and_then(|_| console.flush());
            match result {
                Ok(()) => report.console_written = true,
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(error = %e, "Failed to write console log line");
                }
            }
        }

        drop(state);

        if report.failures > 0 {
            self.failures
                .fetch_add(u64::from(report.failures), Ordering::Relaxed);
        }
        report
    }

    /// Flush and release the file handle
    ///
    /// Returns true if a handle was released by this call. Calling it again is a no-op.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let _ = state.console.flush();

        let Some(mut file) = state.file.take() else {
            return false;
        };
        if let Err(e) = file.flush().and_then(|_| file.sync_all()) {
            tracing::warn!(error = %e, path = ?self.file_path, "Failed to flush log file on close");
        }
        tracing::debug!(path = ?self.file_path, "Closed log file");
        true
    }
}
