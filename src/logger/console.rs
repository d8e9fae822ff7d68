//! Console forwarding
//!
//! When `forward_to_console` is enabled, every appended entry is mirrored to a
//! [`ConsoleSink`] at the entry's severity.

use super::entry::LogLevel;
use super::targets;

/// Prefix used when the logger has no name
pub const DEFAULT_PREFIX: &str = "LogDumper";

/// One forwarded entry, already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleRecord {
    pub level: LogLevel,
    /// `[<name>] <message>`
    pub line: String,
    /// Serialized context, when present
    pub context: Option<String>,
    /// Serialized metadata, when present
    pub metadata: Option<String>,
}

/// Destination for forwarded entries
pub trait ConsoleSink: Send + Sync {
    fn write(&self, record: &ConsoleRecord);
}

/// Format the forwarded line for a logger name and message
pub fn format_line(name: Option<&str>, message: &str) -> String {
    format!("[{}] {}", name.unwrap_or(DEFAULT_PREFIX), message)
}

macro_rules! emit {
    ($mac:ident, $record:expr) => {
        match (&$record.context, &$record.metadata) {
            (Some(context), Some(metadata)) => tracing::$mac!(
                target: targets::CONSOLE,
                context = %context,
                metadata = %metadata,
                "{}",
                $record.line
            ),
            (Some(context), None) => {
                tracing::$mac!(target: targets::CONSOLE, context = %context, "{}", $record.line)
            }
            (None, Some(metadata)) => {
                tracing::$mac!(target: targets::CONSOLE, metadata = %metadata, "{}", $record.line)
            }
            (None, None) => tracing::$mac!(target: targets::CONSOLE, "{}", $record.line),
        }
    };
}

/// Default sink: re-emits entries as `tracing` events on the console target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&self, record: &ConsoleRecord) {
        match record.level {
            LogLevel::Debug => emit!(debug, record),
            LogLevel::Info => emit!(info, record),
            LogLevel::Warn => emit!(warn, record),
            LogLevel::Error => emit!(error, record),
        }
    }
}
