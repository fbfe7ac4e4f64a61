//! Leveled logging for sevlog
//!
//! Provides severity filtering, timestamped colored rendering, a console plus
//! optional file sink, and the fatal path that resolves a named exit code,
//! closes the file and terminates the process.

mod error;
pub mod exit_codes;
mod fatal;
mod level;
mod logger;
mod render;
mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use error::LoggerError;
pub use exit_codes::{ExitCodeTable, Resolution};
pub use fatal::{ProcessTerminator, SideChannel, Terminator};
pub use level::Severity;
pub use logger::{Logger, LoggerBuilder};
pub use render::{join_parts, render, ColorChoice, Message, RenderedLine, TIMESTAMP_FORMAT};
pub use sink::{DualSink, WriteReport};
