//! Log entry data model
//!
//! Entries are created once by a [`Logger`](super::Logger) and never mutated afterwards.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels, least severe first
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Check if this level is a warning or error (for alerts)
    pub fn is_alert(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// Coarse category of an entry, independent of its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Action,
    Error,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Action => "action",
            LogType::Error => "error",
        }
    }
}

/// Ambient environment data stamped onto an entry at creation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
}

/// A single log entry
///
/// `C` is the caller's context payload. The logger never inspects it except to
/// serialize it for search filtering and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry<C = serde_json::Value> {
    /// Unique within the process lifetime
    pub id: String,
    pub level: LogLevel,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub message: String,
    /// Creation instant, millisecond precision
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<C>,
    /// Captured stack text, only on error-type entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LogMetadata>,
    /// Name of the logger that produced this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger_name: Option<String>,
}

impl<C> LogEntry<C> {
    pub(crate) fn new(
        level: LogLevel,
        log_type: LogType,
        message: String,
        context: Option<C>,
        error_stack: Option<String>,
        metadata: Option<LogMetadata>,
        logger_name: Option<String>,
    ) -> Self {
        Self {
            id: generate_log_id(),
            level,
            log_type,
            message,
            timestamp: Utc::now().trunc_subsecs(3),
            context,
            error_stack,
            metadata,
            logger_name,
        }
    }

    /// Whether the entry carries anything worth expanding in a detail view
    pub fn has_details(&self) -> bool {
        self.context.is_some() || self.error_stack.is_some() || self.metadata.is_some()
    }
}

/// Whether `value` serializes to JSON `null`
///
/// Such a context is stored as absent, since an exported `null` reads back as `None`.
pub(crate) fn serializes_to_null<C: Serialize>(value: &C) -> bool {
    let mut written = Prefix(Vec::with_capacity(4));
    serde_json::to_writer(&mut written, value).is_ok() && written.0 == b"null"
}

/// Writer that refuses anything longer than `null`
struct Prefix(Vec<u8>);

impl std::io::Write for Prefix {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.0.len() + buf.len() > 4 {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "not null"));
        }
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Random suffix shared by entry and session identifiers
pub(crate) fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(12);
    suffix
}

fn generate_log_id() -> String {
    format!("log_{}_{}", Utc::now().timestamp_millis(), random_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample(level: LogLevel) -> LogEntry {
        LogEntry::new(
            level,
            LogType::Action,
            "hello".to_string(),
            None,
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_level_ordering_follows_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_is_alert() {
        assert!(!LogLevel::Debug.is_alert());
        assert!(!LogLevel::Info.is_alert());
        assert!(LogLevel::Warn.is_alert());
        assert!(LogLevel::Error.is_alert());
    }

    #[test]
    fn test_trace_folds_into_debug() {
        assert_eq!(LogLevel::from(tracing::Level::TRACE), LogLevel::Debug);
        assert_eq!(LogLevel::from(tracing::Level::WARN), LogLevel::Warn);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| sample(LogLevel::Info).id).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("log_")));
    }

    #[test]
    fn test_serialization_uses_wire_field_names() {
        let mut entry = sample(LogLevel::Warn);
        entry.error_stack = Some("at main".to_string());
        entry.logger_name = Some("auth".to_string());
        entry.metadata = Some(LogMetadata {
            session_id: Some("session_1".to_string()),
            component_name: Some("Counter".to_string()),
            ..Default::default()
        });

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["level"], "warn");
        assert_eq!(value["type"], "action");
        assert_eq!(value["errorStack"], "at main");
        assert_eq!(value["loggerName"], "auth");
        assert_eq!(value["metadata"]["sessionId"], "session_1");
        assert_eq!(value["metadata"]["componentName"], "Counter");
        assert!(value["metadata"].get("url").is_none());
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let value = serde_json::to_value(sample(LogLevel::Debug)).unwrap();
        let object = value.as_object().unwrap();
        for field in ["context", "errorStack", "metadata", "loggerName"] {
            assert!(!object.contains_key(field), "{} should be omitted", field);
        }
    }

    #[test]
    fn test_serializes_to_null() {
        assert!(serializes_to_null(&serde_json::Value::Null));
        assert!(serializes_to_null(&()));
        assert!(!serializes_to_null(&serde_json::json!({"a": null})));
        assert!(!serializes_to_null(&"null"));
        assert!(!serializes_to_null(&0));
    }

    #[test]
    fn test_missing_context_deserializes_as_none() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Ctx {
            user: String,
        }

        let json = r#"{"id":"log_1_a","level":"info","type":"action","message":"m",
            "timestamp":"2024-01-01T00:00:00Z"}"#;
        let entry: LogEntry<Ctx> = serde_json::from_str(json).unwrap();
        assert!(entry.context.is_none());
    }

    #[test]
    fn test_has_details() {
        let mut entry = sample(LogLevel::Info);
        assert!(!entry.has_details());
        entry.context = Some(serde_json::json!({ "page": "home" }));
        assert!(entry.has_details());
    }
}
