//! Named logger registry
//!
//! Named loggers are created on first request. Unless overridden, they inherit the
//! parent logger's bound, console forwarding and metadata capture. A named logger's
//! configuration is fixed once created; asking for the same name again returns the
//! same instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::logger::{Logger, LoggerOptions};

/// Explicit options for a named logger; `None` inherits from the parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOverrides {
    pub max_entries: Option<usize>,
    pub forward_to_console: Option<bool>,
    pub capture_metadata: Option<bool>,
}

impl LoggerOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn forward_to_console(mut self, forward: bool) -> Self {
        self.forward_to_console = Some(forward);
        self
    }

    pub fn capture_metadata(mut self, capture: bool) -> Self {
        self.capture_metadata = Some(capture);
        self
    }

    /// Resolve the options for `name` against the parent's options
    pub fn resolve(&self, parent: &LoggerOptions, name: &str) -> LoggerOptions {
        LoggerOptions {
            max_entries: self.max_entries.or(parent.max_entries),
            forward_to_console: self.forward_to_console.unwrap_or(parent.forward_to_console),
            capture_metadata: self.capture_metadata.unwrap_or(parent.capture_metadata),
            name: Some(name.to_string()),
        }
    }
}

/// Parent logger plus the named loggers derived from it
pub struct LoggerRegistry<C = serde_json::Value> {
    parent: Arc<Logger<C>>,
    named: Mutex<HashMap<String, Arc<Logger<C>>>>,
}

impl<C> LoggerRegistry<C>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    pub fn new(parent: Arc<Logger<C>>) -> Self {
        Self {
            parent,
            named: Mutex::new(HashMap::new()),
        }
    }

    /// The logger named loggers inherit from
    pub fn parent(&self) -> &Arc<Logger<C>> {
        &self.parent
    }

    /// Get the logger called `name`, creating it with `overrides` if it does not exist
    ///
    /// Overrides are ignored when the logger already exists. An empty name resolves
    /// to the parent.
    pub fn get_or_create(&self, name: &str, overrides: &LoggerOverrides) -> Arc<Logger<C>> {
        if name.is_empty() {
            return Arc::clone(&self.parent);
        }

        let mut named = match self.named.lock() {
            Ok(named) => named,
            Err(poisoned) => poisoned.into_inner(),
        };

        let logger = named.entry(name.to_string()).or_insert_with(|| {
            let options = overrides.resolve(self.parent.options(), name);
            tracing::debug!("Creating named logger {} ({:?})", name, options);
            Arc::new(self.parent.sibling(options))
        });
        Arc::clone(logger)
    }

    /// Get an existing named logger
    pub fn get(&self, name: &str) -> Option<Arc<Logger<C>>> {
        self.named
            .lock()
            .ok()
            .and_then(|named| named.get(name).cloned())
    }

    /// Names of every created logger, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .named
            .lock()
            .map(|named| named.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Number of named loggers
    pub fn count(&self) -> usize {
        self.named.lock().map(|named| named.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> Arc<Logger> {
        Arc::new(Logger::new(
            LoggerOptions::default()
                .with_max_entries(50)
                .with_forward_to_console(true)
                .with_capture_metadata(false),
        ))
    }

    #[test]
    fn test_named_logger_inherits_parent_options() {
        let registry = LoggerRegistry::new(parent());
        let auth = registry.get_or_create("auth", &LoggerOverrides::new());

        let options = auth.options();
        assert_eq!(options.max_entries, Some(50));
        assert!(options.forward_to_console);
        assert!(!options.capture_metadata);
        assert_eq!(auth.name(), Some("auth"));
    }

    #[test]
    fn test_explicit_override_wins() {
        let registry = LoggerRegistry::new(parent());
        let overrides = LoggerOverrides::new()
            .forward_to_console(false)
            .max_entries(5);
        let auth = registry.get_or_create("auth", &overrides);

        assert!(!auth.options().forward_to_console);
        assert_eq!(auth.options().max_entries, Some(5));
        assert!(!auth.options().capture_metadata);
    }

    #[test]
    fn test_same_name_returns_same_instance() {
        let registry = LoggerRegistry::new(parent());
        let first = registry.get_or_create("auth", &LoggerOverrides::new());
        let second = registry.get_or_create("auth", &LoggerOverrides::new().max_entries(1));

        assert!(Arc::ptr_eq(&first, &second));
        // Configuration fixed at creation
        assert_eq!(second.options().max_entries, Some(50));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_named_entries_carry_name() {
        let registry = LoggerRegistry::new(parent());
        let auth = registry.get_or_create("auth", &LoggerOverrides::new());
        auth.log_info("User logged in", None, None);

        assert_eq!(auth.all_entries()[0].logger_name.as_deref(), Some("auth"));
        // Named loggers keep their own buffer
        assert!(registry.parent().is_empty());
    }

    #[test]
    fn test_empty_name_resolves_to_parent() {
        let registry = LoggerRegistry::new(parent());
        let logger = registry.get_or_create("", &LoggerOverrides::new());
        assert!(Arc::ptr_eq(&logger, registry.parent()));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_get_and_names() {
        let registry = LoggerRegistry::new(parent());
        assert!(registry.get("auth").is_none());

        registry.get_or_create("payments", &LoggerOverrides::new());
        registry.get_or_create("auth", &LoggerOverrides::new());

        assert!(registry.get("auth").is_some());
        assert_eq!(registry.names(), ["auth", "payments"]);
    }
}
