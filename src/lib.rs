//! sevlog - leveled, colorized logging with named fatal exit codes
//!
//! Messages below a minimum severity are dropped; accepted ones are written
//! to the console and, optionally, appended to a log file. Fatal messages
//! close the file and exit the process with a code chosen by name.

pub mod config;
pub mod logging;

pub use config::LoggerConfig;
pub use logging::{ColorChoice, ExitCodeTable, Logger, LoggerBuilder, LoggerError, Severity};
