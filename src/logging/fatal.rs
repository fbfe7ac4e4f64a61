//! Process termination and the diagnostic side channel used on the fatal path

use std::io::Write;
use std::sync::Mutex;

/// Ends the process with an exit code
///
/// The default [`ProcessTerminator`] calls [`std::process::exit`]. Other
/// implementations must also never return, for example by unwinding.
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32) -> !;
}

/// Terminates the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Diagnostics stream kept apart from the log sinks (stderr by default)
///
/// Messages about the logger itself go here, so reporting a bad exit code
/// name can never re-enter the fatal path.
pub struct SideChannel {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl SideChannel {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Write one diagnostic line; failures are ignored
    pub fn report(&self, message: &str) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(writer, "sevlog: {}", message);
        let _ = writer.flush();
    }
}

impl Default for SideChannel {
    fn default() -> Self {
        Self::stderr()
    }
}
