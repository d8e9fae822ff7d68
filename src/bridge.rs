//! Tracing integration
//!
//! Routes the application's `tracing` events into a [`Logger`] so they show up in the
//! DevTools panel next to explicit log calls. Events emitted by the logger itself
//! (console forwarding, subscriber diagnostics) are skipped, otherwise forwarding
//! would feed back into the buffer forever. Those go to a timestamped log file
//! instead, since the terminal belongs to the UI.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context as _, Result};
use chrono::Local;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::logger::{targets, CapturedError, LogLevel, Logger};

/// Default filter when `RUST_LOG` is not set
///
/// Console forwarding mirrors every level, so its target is let through at debug.
pub const DEFAULT_FILTER: &str = "info,logdumper::console=debug";

/// Information about the current log file
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    /// Full path to the log file
    pub path: PathBuf,
}

/// Generate a timestamped log file path
pub fn create_log_file_path(logs_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    logs_dir.join(format!("logdumper-{}.log", timestamp))
}

/// Collects the message and the remaining fields of an event
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.fields.insert(field.name().to_string(), Value::String(text));
        }
    }
}

/// `tracing` layer appending every event to a logger
///
/// The event target becomes the entry's component name; structured fields become
/// the context object.
pub struct LoggerLayer {
    logger: Arc<Logger>,
}

impl LoggerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if targets::is_internal(metadata.target()) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let message = visitor.message.unwrap_or_default();
        let context = if visitor.fields.is_empty() {
            None
        } else {
            Some(Value::Object(visitor.fields))
        };
        let target = Some(metadata.target());

        match LogLevel::from(*metadata.level()) {
            LogLevel::Debug => self.logger.log_debug(message, context, target),
            LogLevel::Info => self.logger.log_info(message, context, target),
            LogLevel::Warn => self.logger.log_warn(message, context, target),
            LogLevel::Error => {
                let failure = CapturedError::with_stack(message, None);
                self.logger.log_error(&failure, context, target)
            }
        }
    }
}

/// Plain-text output for the logger's own targets
///
/// Console-forwarded entries and subscriber diagnostics are written to `file`; every
/// other event is left to [`LoggerLayer`].
pub fn console_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter_fn(|metadata| targets::is_internal(metadata.target())))
}

/// Install the global `tracing` subscriber feeding `logger`
///
/// Filtering follows `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Nothing is written
/// to the terminal: application events land in the panel, the logger's own output in
/// a new file under `logs_dir`.
pub fn init_logging(logger: Arc<Logger>, logs_dir: &Path) -> Result<LogFileInfo> {
    fs::create_dir_all(logs_dir).context("Failed to create logs directory")?;

    let log_path = create_log_file_path(logs_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(LoggerLayer::new(logger))
        .with(console_layer(file))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogFileInfo { path: log_path })
}
