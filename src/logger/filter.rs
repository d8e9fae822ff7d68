//! Filters for reading entries back out of a logger

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entry::{LogEntry, LogLevel, LogType};

/// Criteria for [`Logger::get_logs`](super::Logger::get_logs)
///
/// Every set criterion must match (logical AND). An empty search string matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Exact level
    pub level: Option<LogLevel>,
    /// Exact type
    pub log_type: Option<LogType>,
    /// Inclusive lower bound on the entry timestamp
    pub since: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the message or the serialized context
    pub search: Option<String>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn log_type(mut self, log_type: LogType) -> Self {
        self.log_type = Some(log_type);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Whether no criterion is set
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.log_type.is_none()
            && self.since.is_none()
            && self.search.as_deref().map_or(true, str::is_empty)
    }

    /// Check a single entry against this filter
    pub fn matches<C: Serialize>(&self, entry: &LogEntry<C>) -> bool {
        let needle = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        self.matches_with(entry, needle.as_deref())
    }

    /// Apply this filter to a sequence, preserving order
    pub fn apply<'a, C, I>(&self, entries: I) -> Vec<LogEntry<C>>
    where
        C: Serialize + Clone + 'a,
        I: IntoIterator<Item = &'a LogEntry<C>>,
    {
        let needle = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        entries
            .into_iter()
            .filter(|entry| self.matches_with(entry, needle.as_deref()))
            .cloned()
            .collect()
    }

    fn matches_with<C: Serialize>(&self, entry: &LogEntry<C>, needle: Option<&str>) -> bool {
        if self.level.is_some_and(|level| entry.level != level) {
            return false;
        }
        if self.log_type.is_some_and(|t| entry.log_type != t) {
            return false;
        }
        if self.since.is_some_and(|since| entry.timestamp < since) {
            return false;
        }
        match needle {
            Some(needle) => search_matches(entry, needle),
            None => true,
        }
    }
}

/// Case-insensitive match of an already-lowercased needle against message and context
pub fn search_matches<C: Serialize>(entry: &LogEntry<C>, needle: &str) -> bool {
    if entry.message.to_lowercase().contains(needle) {
        return true;
    }
    entry
        .context
        .as_ref()
        .and_then(|context| serde_json::to_string(context).ok())
        .is_some_and(|json| json.to_lowercase().contains(needle))
}
