//! Ambient environment used for metadata capture
//!
//! The session identifier is process-wide: every logger in the process stamps the
//! same value, created lazily on first use.

use std::sync::OnceLock;

use chrono::Utc;

use super::entry::{random_suffix, LogMetadata};

/// Environment variable consulted before generating a fresh session id
pub const SESSION_ID_ENV: &str = "LOGDUMPER_SESSION_ID";

static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Get the session identifier shared by all loggers in this process
pub fn session_id() -> &'static str {
    SESSION_ID.get_or_init(|| {
        std::env::var(SESSION_ID_ENV)
            .ok()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_session_id)
    })
}

fn generate_session_id() -> String {
    format!("session_{}_{}", Utc::now().timestamp_millis(), random_suffix())
}

/// Source of the ambient data stamped onto entries
pub trait Environment: Send + Sync {
    /// Whether an environment exists at all. When false, metadata is omitted entirely.
    fn is_available(&self) -> bool {
        true
    }

    /// Location the application is currently showing
    fn url(&self) -> Option<String>;

    /// Description of the host application
    fn user_agent(&self) -> Option<String>;

    /// Capture metadata for a new entry, or `None` when no environment is available
    fn capture(&self, component_name: Option<&str>) -> Option<LogMetadata> {
        if !self.is_available() {
            return None;
        }
        Some(LogMetadata {
            url: self.url(),
            session_id: Some(session_id().to_string()),
            user_agent: self.user_agent(),
            component_name: component_name.map(str::to_string),
        })
    }
}

/// Environment of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn url(&self) -> Option<String> {
        std::env::current_dir()
            .ok()
            .map(|dir| format!("file://{}", dir.display()))
    }

    fn user_agent(&self) -> Option<String> {
        Some(format!(
            "{}/{} ({}; {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    }
}

/// No ambient environment (headless workers, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedEnvironment;

impl Environment for DetachedEnvironment {
    fn is_available(&self) -> bool {
        false
    }

    fn url(&self) -> Option<String> {
        None
    }

    fn user_agent(&self) -> Option<String> {
        None
    }
}
