//! The logger: severity filter, rendering, sinks and the fatal path

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use crossterm::tty::IsTty;

use super::error::LoggerError;
use super::exit_codes::{self, ExitCodeTable, Resolution};
use super::fatal::{ProcessTerminator, SideChannel, Terminator};
use super::level::Severity;
use super::render::{render, ColorChoice, Message};
use super::sink::{open_log_file, DualSink};

/// Leveled logger writing to the console and an optional append-only file
///
/// Messages below the minimum severity are dropped before any formatting.
/// A FATAL message, whether logged through [`Logger::fatal`] or
/// [`Logger::log`], flushes and closes the file and then terminates the
/// process with a code looked up in the logger's [`ExitCodeTable`].
pub struct Logger {
    min_level: Severity,
    console: bool,
    colored: bool,
    exit_codes: ExitCodeTable,
    implicit_fatal_exit: String,
    sink: DualSink,
    side_channel: SideChannel,
    terminator: Box<dyn Terminator>,
}

impl Logger {
    /// Create a logger with the default exit-code table
    ///
    /// Fails if `file_path` is given and cannot be opened for appending.
    pub fn new(
        min_level: Severity,
        file_path: Option<&Path>,
        also_console: bool,
    ) -> Result<Self, LoggerError> {
        let mut builder = Self::builder(min_level).console(also_console);
        if let Some(path) = file_path {
            builder = builder.file(path);
        }
        builder.build()
    }

    /// Start building a logger with the given minimum severity
    pub fn builder(min_level: Severity) -> LoggerBuilder {
        LoggerBuilder::new(min_level)
    }

    /// Minimum severity this logger emits
    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    /// Check whether a message at `level` would be emitted
    pub fn enabled(&self, level: Severity) -> bool {
        level.passes(self.min_level)
    }

    /// Path of the log file, if one was configured
    pub fn file_path(&self) -> Option<&Path> {
        self.sink.file_path()
    }

    pub fn exit_codes(&self) -> &ExitCodeTable {
        &self.exit_codes
    }

    /// Exit-code name used when FATAL is logged without an explicit name
    pub fn implicit_fatal_exit(&self) -> &str {
        &self.implicit_fatal_exit
    }

    /// Number of sink writes that failed since construction
    pub fn write_failures(&self) -> u64 {
        self.sink.failures()
    }

    pub fn debug(&self, parts: impl Message) {
        self.log(Severity::Debug, parts);
    }

    pub fn info(&self, parts: impl Message) {
        self.log(Severity::Info, parts);
    }

    pub fn warning(&self, parts: impl Message) {
        self.log(Severity::Warning, parts);
    }

    pub fn error(&self, parts: impl Message) {
        self.log(Severity::Error, parts);
    }

    /// Log a message at `level`
    ///
    /// At [`Severity::Fatal`] this does not return: it takes the same path as
    /// [`Logger::fatal`] using the implicit exit-code name.
    pub fn log(&self, level: Severity, parts: impl Message) {
        if level == Severity::Fatal {
            self.terminate(&self.implicit_fatal_exit, parts);
        }
        self.emit(level, parts);
    }

    /// Log a FATAL message, close the file and exit with the named code
    ///
    /// Unknown names fall back to the `SUCCESS` code and are reported on the
    /// side channel.
    pub fn fatal(&self, exit_code_name: &str, parts: impl Message) -> ! {
        self.terminate(exit_code_name, parts)
    }

    /// Flush and close the log file
    ///
    /// Safe to call repeatedly. Console logging keeps working afterwards.
    pub fn close(&self) {
        self.sink.close();
    }

    fn emit(&self, level: Severity, parts: impl Message) {
        if !self.enabled(level) {
            return;
        }
        let message = parts.into_message();
        let line = render(level, &message, &Local::now(), self.colored);
        // failures are counted by the sink
        self.sink.write(&line, true, self.console);
    }

    fn terminate(&self, exit_code_name: &str, parts: impl Message) -> ! {
        self.emit(Severity::Fatal, parts);

        let code = match self.exit_codes.resolve(exit_code_name) {
            Resolution::Known(code) => code,
            Resolution::Fallback(code) => {
                self.side_channel.report(&format!(
                    "invalid exit code name '{}', defaulting to '{}' ({})",
                    exit_code_name,
                    exit_codes::SUCCESS,
                    code
                ));
                code
            }
        };

        self.side_channel
            .report(&format!("a fatal error occurred, exiting with code {}", code));
        self.sink.close();

        self.terminator.terminate(code)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sink.close();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("file_path", &self.sink.file_path())
            .field("console", &self.console)
            .field("colored", &self.colored)
            .field("exit_codes", &self.exit_codes)
            .field("implicit_fatal_exit", &self.implicit_fatal_exit)
            .finish()
    }
}

/// Builder for [`Logger`]
pub struct LoggerBuilder {
    min_level: Severity,
    file_path: Option<PathBuf>,
    console: bool,
    color: ColorChoice,
    exit_codes: ExitCodeTable,
    implicit_fatal_exit: String,
    console_writer: Option<Box<dyn Write + Send>>,
    diagnostics_writer: Option<Box<dyn Write + Send>>,
    terminator: Option<Box<dyn Terminator>>,
}

impl LoggerBuilder {
    pub fn new(min_level: Severity) -> Self {
        Self {
            min_level,
            file_path: None,
            console: true,
            color: ColorChoice::Auto,
            exit_codes: ExitCodeTable::default(),
            implicit_fatal_exit: exit_codes::ERROR.to_string(),
            console_writer: None,
            diagnostics_writer: None,
            terminator: None,
        }
    }

    /// Also append plain lines to this file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Write colored lines to the console (default: true)
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn color(mut self, choice: ColorChoice) -> Self {
        self.color = choice;
        self
    }

    pub fn exit_codes(mut self, table: ExitCodeTable) -> Self {
        self.exit_codes = table;
        self
    }

    /// Exit-code name used when FATAL is logged through [`Logger::log`] (default: `ERROR`)
    pub fn implicit_fatal_exit(mut self, name: impl Into<String>) -> Self {
        self.implicit_fatal_exit = name.into();
        self
    }

    /// Replace stdout as the console stream
    ///
    /// With [`ColorChoice::Auto`] a replaced console is never colored.
    pub fn console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console_writer = Some(Box::new(writer));
        self
    }

    /// Replace stderr as the diagnostic side channel
    pub fn diagnostics_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.diagnostics_writer = Some(Box::new(writer));
        self
    }

    /// Replace process exit on the fatal path
    pub fn terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.terminator = Some(Box::new(terminator));
        self
    }

    /// Open the log file (if any) and build the logger
    pub fn build(self) -> Result<Logger, LoggerError> {
        let file = match self.file_path {
            Some(path) => {
                let file = open_log_file(&path)?;
                tracing::debug!(path = %path.display(), "Opened log file");
                Some((path, file))
            }
            None => None,
        };

        let colored = match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.console_writer.is_none() && std::io::stdout().is_tty(),
        };

        let console = self
            .console_writer
            .unwrap_or_else(|| Box::new(std::io::stdout()));
        let side_channel = self
            .diagnostics_writer
            .map(SideChannel::new)
            .unwrap_or_default();
        let terminator = self
            .terminator
            .unwrap_or_else(|| Box::new(ProcessTerminator));

        Ok(Logger {
            min_level: self.min_level,
            console: self.console,
            colored,
            exit_codes: self.exit_codes,
            implicit_fatal_exit: self.implicit_fatal_exit,
            sink: DualSink::new(file, console),
            side_channel,
            terminator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::SharedBuffer;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    /// Panic payload carrying the code the logger tried to exit with
    #[derive(Debug)]
    struct Terminated(i32);

    struct UnwindingTerminator;

    impl Terminator for UnwindingTerminator {
        fn terminate(&self, code: i32) -> ! {
            panic::panic_any(Terminated(code))
        }
    }

    struct Harness {
        _temp_dir: TempDir,
        path: PathBuf,
        console: SharedBuffer,
        diagnostics: SharedBuffer,
    }

    impl Harness {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("app.log");
            Self {
                _temp_dir: temp_dir,
                path,
                console: SharedBuffer::new(),
                diagnostics: SharedBuffer::new(),
            }
        }

        fn builder(&self, min_level: Severity) -> LoggerBuilder {
            Logger::builder(min_level)
                .file(&self.path)
                .color(ColorChoice::Never)
                .console_writer(self.console.clone())
                .diagnostics_writer(self.diagnostics.clone())
                .terminator(UnwindingTerminator)
        }

        fn logger(&self, min_level: Severity) -> Logger {
            self.builder(min_level).build().unwrap()
        }

        fn file_lines(&self) -> Vec<String> {
            std::fs::read_to_string(&self.path)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    /// Run a fatal call and return the exit code it tried to terminate with
    fn exit_code_of(f: impl FnOnce()) -> i32 {
        let payload = panic::catch_unwind(AssertUnwindSafe(f)).expect_err("fatal path returned");
        payload
            .downcast::<Terminated>()
            .expect("unexpected panic payload")
            .0
    }

    /// Check the `[YYYY-MM-DD HH:MM:SS] LEVEL: message` layout
    fn assert_line_format(line: &str, level: &str, message: &str) {
        assert_eq!(line.len(), 22 + level.len() + 2 + message.len(), "{}", line);
        assert!(line.starts_with('['), "{}", line);
        assert_eq!(&line[20..22], "] ", "{}", line);
        let stamp = &line[1..20];
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "{}",
            line
        );
        assert_eq!(&line[22..], format!("{}: {}", level, message));
    }

    #[test]
    fn test_threshold_example_scenario() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Warning);

        logger.debug("x");
        logger.info("y");
        logger.warning("low disk");
        logger.error(["disk", "full"]);
        logger.close();

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 2);
        assert_line_format(&lines[0], "WARNING", "low disk");
        assert_line_format(&lines[1], "ERROR", "disk full");

        let console: Vec<String> = harness.console.contents().lines().map(str::to_string).collect();
        assert_eq!(console, lines);
    }

    #[test]
    fn test_emits_iff_level_meets_threshold() {
        for threshold in Severity::ALL {
            for level in [Severity::Debug, Severity::Info, Severity::Warning, Severity::Error] {
                let harness = Harness::new();
                let logger = harness.logger(threshold);

                logger.log(level, "probe");
                logger.close();

                let written = !harness.file_lines().is_empty();
                assert_eq!(written, level >= threshold, "{:?} at {:?}", level, threshold);
                assert_eq!(!harness.console.contents().is_empty(), written);
            }
        }
    }

    #[test]
    fn test_rejected_messages_write_nothing() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Error);

        logger.debug("a");
        logger.info(["b", "c"]);
        logger.warning(String::from("d"));
        logger.close();

        assert_eq!(std::fs::metadata(&harness.path).unwrap().len(), 0);
        assert!(harness.console.contents().is_empty());
        assert!(harness.diagnostics.contents().is_empty());
    }

    #[test]
    fn test_lines_keep_call_order() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Debug);

        for i in 0..50 {
            logger.info(format!("message {}", i));
        }
        logger.close();

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 50);
        for (i, line) in lines.iter().enumerate() {
            assert_line_format(line, "INFO", &format!("message {}", i));
        }
        assert!(std::fs::read_to_string(&harness.path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_close_twice_is_safe() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Info);

        logger.info("before close");
        logger.close();
        logger.close();
        logger.info("after close");

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 1);
        assert_line_format(&lines[0], "INFO", "before close");
        assert_eq!(harness.console.contents().lines().count(), 2);
        assert_eq!(logger.write_failures(), 0);
    }

    #[test]
    fn test_console_disabled() {
        let harness = Harness::new();
        let logger = harness.builder(Severity::Info).console(false).build().unwrap();

        logger.info("file only");
        logger.close();

        assert_eq!(harness.file_lines().len(), 1);
        assert!(harness.console.contents().is_empty());
    }

    #[test]
    fn test_console_only_logger() {
        let console = SharedBuffer::new();
        let logger = Logger::builder(Severity::Info)
            .color(ColorChoice::Never)
            .console_writer(console.clone())
            .build()
            .unwrap();

        logger.info("no file");
        assert!(logger.file_path().is_none());
        assert!(console.contents().ends_with("INFO: no file\n"));
    }

    #[test]
    fn test_new_fails_for_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("app.log");

        let result = Logger::new(Severity::Info, Some(path.as_path()), false);
        match result {
            Err(LoggerError::OpenLogFile { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected open error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_appends_to_existing_file() {
        let harness = Harness::new();
        std::fs::write(&harness.path, "previous line\n").unwrap();

        let logger = Logger::new(Severity::Info, Some(harness.path.as_path()), false).unwrap();
        logger.info("next");
        logger.close();

        let lines = harness.file_lines();
        assert_eq!(lines[0], "previous line");
        assert_line_format(&lines[1], "INFO", "next");
    }

    #[test]
    fn test_fatal_known_name_uses_configured_code() {
        let harness = Harness::new();
        let logger = harness
            .builder(Severity::Debug)
            .exit_codes(ExitCodeTable::default().with_code("SHUTDOWN", 3))
            .build()
            .unwrap();

        let code = exit_code_of(|| logger.fatal("SHUTDOWN", "msg"));
        assert_eq!(code, 3);

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 1);
        assert_line_format(&lines[0], "FATAL", "msg");
        assert!(!harness.diagnostics.contents().contains("invalid exit code name"));
    }

    #[test]
    fn test_fatal_unknown_name_defaults_to_success() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Debug);

        let code = exit_code_of(|| logger.fatal("UNKNOWN_NAME", ["shutting", "down"]));
        assert_eq!(code, 0);

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 1);
        assert_line_format(&lines[0], "FATAL", "shutting down");

        let diagnostics = harness.diagnostics.contents();
        assert!(diagnostics.contains("invalid exit code name 'UNKNOWN_NAME'"));
        // diagnostics never reach the log sinks
        assert!(!harness.console.contents().contains("invalid exit code name"));
    }

    #[test]
    fn test_fatal_passes_highest_threshold() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Fatal);

        logger.error("suppressed");
        let code = exit_code_of(|| logger.fatal("ERROR", "boom"));
        assert_eq!(code, -1);

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 1);
        assert_line_format(&lines[0], "FATAL", "boom");
    }

    #[test]
    fn test_fatal_closes_file_before_terminating() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Info);

        exit_code_of(|| logger.fatal("SUCCESS", "bye"));

        // the handle is gone, so later writes cannot reach the file
        logger.error("after fatal");
        assert_eq!(harness.file_lines().len(), 1);
        assert!(harness
            .diagnostics
            .contents()
            .contains("a fatal error occurred, exiting with code 0"));
    }

    #[test]
    fn test_log_at_fatal_uses_implicit_exit_name() {
        let harness = Harness::new();
        let logger = harness.logger(Severity::Info);

        let code = exit_code_of(|| logger.log(Severity::Fatal, "via log"));
        assert_eq!(code, -1);
        assert_line_format(&harness.file_lines()[0], "FATAL", "via log");
    }

    #[test]
    fn test_implicit_exit_name_is_configurable() {
        let harness = Harness::new();
        let logger = harness
            .builder(Severity::Info)
            .implicit_fatal_exit("SHUTDOWN")
            .exit_codes(ExitCodeTable::default().with_code("SHUTDOWN", 9))
            .build()
            .unwrap();

        assert_eq!(logger.implicit_fatal_exit(), "SHUTDOWN");
        let code = exit_code_of(|| logger.log(Severity::Fatal, "stop"));
        assert_eq!(code, 9);
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let harness = Harness::new();
        let logger = Arc::new(harness.logger(Severity::Info));

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    let tag = t.to_string();
                    for i in 0..25 {
                        logger.info(["thread", tag.as_str(), "message", i.to_string().as_str()]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        logger.close();

        let lines = harness.file_lines();
        assert_eq!(lines.len(), 16 * 25);
        for line in &lines {
            let (_, message) = line.split_once("INFO: ").unwrap();
            let words: Vec<&str> = message.split(' ').collect();
            assert_eq!(words.len(), 4, "{}", line);
            assert_eq!(words[0], "thread");
            assert_eq!(words[2], "message");
            assert_line_format(line, "INFO", message);
        }
        assert_eq!(harness.console.contents().lines().count(), 16 * 25);
    }

    #[test]
    fn test_drop_closes_file() {
        let harness = Harness::new();
        {
            let logger = harness.logger(Severity::Info);
            logger.info("dropped");
        }
        assert_eq!(harness.file_lines().len(), 1);
    }

    #[test]
    fn test_enabled() {
        let logger = Logger::builder(Severity::Warning)
            .console_writer(SharedBuffer::new())
            .build()
            .unwrap();
        assert!(!logger.enabled(Severity::Info));
        assert!(logger.enabled(Severity::Warning));
        assert!(logger.enabled(Severity::Fatal));
        assert_eq!(logger.min_level(), Severity::Warning);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_file_write_failure_is_counted_not_raised() {
        let console = SharedBuffer::new();
        let logger = Logger::builder(Severity::Info)
            .file("/dev/full")
            .color(ColorChoice::Never)
            .console_writer(console.clone())
            .build()
            .unwrap();

        logger.info("first");
        logger.error("second");

        assert_eq!(logger.write_failures(), 2);
        let lines: Vec<String> = console.contents().lines().map(str::to_string).collect();
        assert_eq!(lines.len(), 2);
        assert_line_format(&lines[0], "INFO", "first");
        assert_line_format(&lines[1], "ERROR", "second");
    }
}
