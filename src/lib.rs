//! LogDumper - in-memory application logging with a live inspection panel
//!
//! The [`logger::Logger`] keeps a bounded, ordered buffer of structured entries, fans
//! them out to subscribers and exports them as JSON. Around it sit named loggers
//! ([`registry`]), thread-scoped providers ([`scope`]), an [`boundary::ErrorBoundary`]
//! that records caught failures, a `tracing` bridge and a terminal DevTools panel.

pub mod app;
pub mod boundary;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logger;
pub mod registry;
pub mod scope;
pub mod tui;

pub use boundary::{ErrorBoundary, Fallback};
pub use error::{Error, Result};
pub use logger::{LogEntry, LogFilter, LogLevel, LogType, Logger, LoggerOptions, Subscription};
pub use registry::{LoggerOverrides, LoggerRegistry};
