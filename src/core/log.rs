//! Text log for invariant dumps and failure reports.
//!
//! The analysis never prints; everything goes through a byte-bounded
//! buffer the caller owns. This keeps the core usable without `std` and
//! lets a driver decide where the output lands.

use crate::stdlib::String;

/// Log level threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// No logging.
    Off = 0,
    /// Only failures.
    Error = 1,
    /// Failures and invariant dumps.
    #[default]
    Info = 2,
    /// Everything, including per-instruction traces.
    Debug = 3,
}

/// Bounded text buffer collecting verifier output.
#[derive(Debug, Clone)]
pub struct VerifierLog {
    /// Level threshold; messages above it are dropped.
    pub level: LogLevel,
    buffer: String,
    max_size: usize,
    truncated: bool,
}

impl Default for VerifierLog {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl VerifierLog {
    /// A log with the given threshold and a 1 MiB cap.
    pub fn new(level: LogLevel) -> Self {
        VerifierLog { level, buffer: String::new(), max_size: 1024 * 1024, truncated: false }
    }

    /// A log with a custom byte cap.
    pub fn with_max_size(level: LogLevel, max_size: usize) -> Self {
        VerifierLog { level, buffer: String::new(), max_size, truncated: false }
    }

    /// Whether messages at `level` are recorded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level && self.level != LogLevel::Off
    }

    /// Append one line at the given level.
    pub fn log(&mut self, level: LogLevel, msg: &str) {
        if !self.enabled(level) || self.truncated {
            return;
        }
        if self.buffer.len() + msg.len() + 1 > self.max_size {
            self.truncated = true;
            self.buffer.push_str("... log truncated ...\n");
            return;
        }
        self.buffer.push_str(msg);
        self.buffer.push('\n');
    }

    /// Append a failure report.
    pub fn error(&mut self, msg: &str) {
        self.log(LogLevel::Error, msg);
    }

    /// Append an invariant dump line.
    pub fn info(&mut self, msg: &str) {
        self.log(LogLevel::Info, msg);
    }

    /// Append a trace line.
    pub fn debug(&mut self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    /// The collected text.
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the collected text.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.truncated = false;
    }
}
