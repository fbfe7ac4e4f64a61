//! Line rendering for the file and console sinks

use chrono::{DateTime, Local};
use crossterm::style::Stylize;
use serde::{Deserialize, Serialize};

use super::level::Severity;

/// Timestamp format used in every log line (sortable, second granularity)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whether console output carries ANSI colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when writing to a terminal on stdout
    #[default]
    Auto,
    Always,
    Never,
}

/// A message rendered for both sinks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// Plain line for the log file, newline-terminated
    pub file_line: String,
    /// Console line, colored when enabled, newline-terminated
    pub console_line: String,
}

/// Message parts that can be joined into a single log message
///
/// Implemented for single strings and for arrays, slices and vectors of
/// strings, so callers can write either `logger.info("ready")` or
/// `logger.info(["disk", "full"])`.
pub trait Message {
    fn into_message(self) -> String;
}

impl Message for &str {
    fn into_message(self) -> String {
        self.to_string()
    }
}

impl Message for String {
    fn into_message(self) -> String {
        self
    }
}

impl Message for &String {
    fn into_message(self) -> String {
        self.clone()
    }
}

impl<S: AsRef<str>, const N: usize> Message for [S; N] {
    fn into_message(self) -> String {
        join_parts(self)
    }
}

impl<S: AsRef<str>> Message for &[S] {
    fn into_message(self) -> String {
        join_parts(self)
    }
}

impl<S: AsRef<str>> Message for Vec<S> {
    fn into_message(self) -> String {
        join_parts(self)
    }
}

/// Join message parts with a single space between them
pub fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut message = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        message.push_str(part.as_ref());
    }
    message
}

/// Format a timestamp the way it appears in log lines
pub fn format_timestamp(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a message for both sinks
pub fn render(level: Severity, message: &str, now: &DateTime<Local>, colored: bool) -> RenderedLine {
    let timestamp = format_timestamp(now);
    let file_line = format!("[{}] {}: {}\n", timestamp, level.as_str(), message);

    let console_line = if colored {
        format!(
            "[{}] {}: {}\n",
            timestamp.as_str().white(),
            level.as_str().with(level.color()),
            message
        )
    } else {
        file_line.clone()
    };

    RenderedLine {
        file_line,
        console_line,
    }
}
