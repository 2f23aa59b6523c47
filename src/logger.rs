//! Append-only log sink owned by the environment.
//!
//! Every message is also emitted as a `tracing` event, so hosts that install a
//! subscriber see the same stream live. The history itself is only read by the host
//! (e.g. to flush it to a file at the end of a run).

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Severity of a logged message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("INFO"),
            Severity::Error => f.write_str("ERROR"),
        }
    }
}

/// A single entry in the log history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub text: String,
    pub severity: Severity,
}

impl LogMessage {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.severity, self.text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Logger {
    history: Vec<LogMessage>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational message.
    pub fn log(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{}", text);
        self.history.push(LogMessage {
            text,
            severity: Severity::Info,
        });
    }

    /// Records an error message.
    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{}", text);
        self.history.push(LogMessage {
            text,
            severity: Severity::Error,
        });
    }

    pub fn history(&self) -> &[LogMessage] {
        &self.history
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogMessage> {
        self.history.iter().filter(|m| m.is_error())
    }

    /// Writes the whole history, one `SEVERITY, text` line per message.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for message in &self.history {
            writeln!(out, "{}", message)?;
        }
        Ok(())
    }

    /// Overwrites `path` with the current history.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_keeps_order_and_severity() {
        let mut logger = Logger::new();
        logger.log("Added Robot [id = 1]");
        logger.error("Robot [id = 2]: Out of Bounds");

        assert_eq!(logger.history().len(), 2);
        assert!(!logger.history()[0].is_error());
        assert_eq!(logger.errors().count(), 1);
    }

    #[test]
    fn test_write_format() {
        let mut logger = Logger::new();
        logger.log("hello");
        logger.error("boom");

        let mut buf = Vec::new();
        logger.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "INFO, hello\nERROR, boom\n");
    }
}
