//! Errors surfaced by the logger

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while constructing or configuring a [`Logger`](super::Logger)
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The log file could not be opened for appending
    #[error("failed to open log file {}: {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A severity name did not match any level
    #[error("unknown severity '{0}'")]
    UnknownSeverity(String),
}
