//! In-memory log buffer
//!
//! The [`Logger`] owns an ordered, optionally bounded buffer of entries. Every log
//! call runs the same append pipeline: build the entry, append it, trim the oldest
//! entries past the bound, forward to the console sink, then notify subscribers.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::console::{format_line, ConsoleRecord, ConsoleSink, TracingConsole};
use super::entry::{serializes_to_null, LogEntry, LogLevel, LogType};
use super::environment::{Environment, ProcessEnvironment};
use super::failure::Failure;
use super::filter::LogFilter;
use super::subscriber::{LogSubscriber, SubscriberSet, Subscription};

/// Construction-time configuration of a logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Maximum retained entries. `None` (or 0) keeps everything.
    pub max_entries: Option<usize>,
    /// Mirror every entry to the console sink
    pub forward_to_console: bool,
    /// Stamp entries with environment metadata
    pub capture_metadata: bool,
    /// Name propagated into every entry
    pub name: Option<String>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_entries: None,
            forward_to_console: false,
            capture_metadata: true,
            name: None,
        }
    }
}

impl LoggerOptions {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_forward_to_console(mut self, forward: bool) -> Self {
        self.forward_to_console = forward;
        self
    }

    pub fn with_capture_metadata(mut self, capture: bool) -> Self {
        self.capture_metadata = capture;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Effective bound, treating 0 as unbounded
    pub fn bound(&self) -> Option<usize> {
        self.max_entries.filter(|max| *max > 0)
    }
}

/// Bounded, ordered store of log entries with live subscribers
///
/// Configuration is fixed at construction. All methods take `&self`; share the
/// logger behind an `Arc` to hand it to several consumers.
pub struct Logger<C = serde_json::Value> {
    /// Entries, oldest first
    entries: RwLock<VecDeque<LogEntry<C>>>,
    options: LoggerOptions,
    subscribers: Arc<SubscriberSet<C>>,
    environment: Arc<dyn Environment>,
    console: Arc<dyn ConsoleSink>,
}

impl<C> Logger<C>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    /// Create a logger with the process environment and the tracing console sink
    pub fn new(options: LoggerOptions) -> Self {
        let capacity = options.bound().unwrap_or(0);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            options,
            subscribers: SubscriberSet::new(),
            environment: Arc::new(ProcessEnvironment),
            console: Arc::new(TracingConsole),
        }
    }

    /// Replace the environment used for metadata capture
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// Replace the console forwarding sink
    pub fn with_console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    /// Create another logger with `options` that shares this logger's environment
    /// and console sink
    pub fn sibling(&self, options: LoggerOptions) -> Self {
        Self::new(options)
            .with_environment(Arc::clone(&self.environment))
            .with_console(Arc::clone(&self.console))
    }

    /// Configured name, if any
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// Construction-time configuration
    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    /// Log a debug-level action
    pub fn log_debug(
        &self,
        message: impl Into<String>,
        context: Option<C>,
        component_name: Option<&str>,
    ) {
        self.log_action_at(LogLevel::Debug, message.into(), context, component_name);
    }

    /// Log an info-level action
    pub fn log_info(
        &self,
        message: impl Into<String>,
        context: Option<C>,
        component_name: Option<&str>,
    ) {
        self.log_action_at(LogLevel::Info, message.into(), context, component_name);
    }

    /// Log a warn-level action
    pub fn log_warn(
        &self,
        message: impl Into<String>,
        context: Option<C>,
        component_name: Option<&str>,
    ) {
        self.log_action_at(LogLevel::Warn, message.into(), context, component_name);
    }

    /// Log an action. Same as [`log_info`](Self::log_info), kept as a separate name.
    pub fn log_action(
        &self,
        message: impl Into<String>,
        context: Option<C>,
        component_name: Option<&str>,
    ) {
        self.log_info(message, context, component_name);
    }

    /// Log a failure as an error-level, error-type entry carrying its stack text
    pub fn log_error<F>(&self, error: &F, context: Option<C>, component_name: Option<&str>)
    where
        F: Failure + ?Sized,
    {
        let entry = self.create_entry(
            LogLevel::Error,
            LogType::Error,
            error.message(),
            context,
            error.stack(),
            component_name,
        );
        self.add_entry(entry);
    }

    fn log_action_at(
        &self,
        level: LogLevel,
        message: String,
        context: Option<C>,
        component_name: Option<&str>,
    ) {
        let entry =
            self.create_entry(level, LogType::Action, message, context, None, component_name);
        self.add_entry(entry);
    }

    fn create_entry(
        &self,
        level: LogLevel,
        log_type: LogType,
        message: String,
        context: Option<C>,
        error_stack: Option<String>,
        component_name: Option<&str>,
    ) -> LogEntry<C> {
        let metadata = if self.options.capture_metadata {
            self.environment.capture(component_name)
        } else {
            None
        };

        LogEntry::new(
            level,
            log_type,
            message,
            context.filter(|c| !serializes_to_null(c)),
            error_stack,
            metadata,
            self.options.name.clone(),
        )
    }

    fn add_entry(&self, entry: LogEntry<C>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push_back(entry.clone());
            if let Some(max) = self.options.bound() {
                while entries.len() > max {
                    entries.pop_front();
                }
            }
        }

        self.forward_to_console(&entry);
        self.subscribers.notify(&entry);
    }

    fn forward_to_console(&self, entry: &LogEntry<C>) {
        if !self.options.forward_to_console {
            return;
        }

        let record = ConsoleRecord {
            level: entry.level,
            line: format_line(self.name(), &entry.message),
            context: entry
                .context
                .as_ref()
                .and_then(|c| serde_json::to_string(c).ok()),
            metadata: entry
                .metadata
                .as_ref()
                .and_then(|m| serde_json::to_string(m).ok()),
        };
        self.console.write(&record);
    }

    /// Receive every entry appended from now on
    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: LogSubscriber<C> + 'static,
    {
        self.subscribers.add(Arc::new(subscriber))
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Snapshot of the entries matching `filter`, in insertion order
    pub fn get_logs(&self, filter: &LogFilter) -> Vec<LogEntry<C>> {
        self.entries
            .read()
            .map(|e| filter.apply(e.iter()))
            .unwrap_or_default()
    }

    /// Snapshot of every entry, in insertion order
    pub fn all_entries(&self) -> Vec<LogEntry<C>> {
        self.entries
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of entries in the buffer
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buffered entries at `level`
    pub fn count_by_level(&self, level: LogLevel) -> usize {
        self.entries
            .read()
            .map(|e| e.iter().filter(|entry| entry.level == level).count())
            .unwrap_or(0)
    }

    /// Remove every entry. Configuration and subscribers are kept.
    pub fn clear_logs(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl<C> Default for Logger<C>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(LoggerOptions::default())
    }
}

impl<C> std::fmt::Debug for Logger<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
