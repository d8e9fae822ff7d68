//! Logger engine
//!
//! A bounded, ordered, queryable buffer of log entries that fans new entries out to
//! subscribers and optionally mirrors them to a console sink.

mod buffer;
mod console;
mod entry;
mod environment;
mod export;
mod failure;
mod filter;
mod panics;
mod subscriber;

pub use buffer::{Logger, LoggerOptions};
pub use console::{format_line, ConsoleRecord, ConsoleSink, TracingConsole, DEFAULT_PREFIX};
pub use entry::{LogEntry, LogLevel, LogMetadata, LogType};
pub use environment::{
    session_id, DetachedEnvironment, Environment, ProcessEnvironment, SESSION_ID_ENV,
};
pub use export::{download_dir, load_dump, DEFAULT_DUMP_FILENAME};
pub use failure::{CapturedError, Failure};
pub use filter::{search_matches, LogFilter};
pub use subscriber::{Fallible, LogSubscriber, Subscription};

pub(crate) use panics::{panic_message, take_last_panic, Silenced};

/// `tracing` targets used by the logger's own diagnostics
pub mod targets {
    /// Entries mirrored by console forwarding
    pub const CONSOLE: &str = "logdumper::console";

    /// Subscriber failures and other internal problems
    pub const DIAGNOSTICS: &str = "logdumper::diagnostics";

    /// Whether a target belongs to the logger itself
    pub fn is_internal(target: &str) -> bool {
        target == CONSOLE || target == DIAGNOSTICS
    }
}
