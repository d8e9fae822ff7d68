//! Failure capture
//!
//! Anything exposing a display message and an optional stack text can be logged
//! with [`Logger::log_error`](super::Logger::log_error).

use std::backtrace::{Backtrace, BacktraceStatus};

use thiserror::Error;

/// A failure that can be recorded as an error entry
pub trait Failure {
    /// Human-readable message
    fn message(&self) -> String;

    /// Captured stack text, if the failure carries one
    fn stack(&self) -> Option<String>;
}

impl<F: Failure + ?Sized> Failure for &F {
    fn message(&self) -> String {
        (**self).message()
    }

    fn stack(&self) -> Option<String> {
        (**self).stack()
    }
}

impl Failure for anyhow::Error {
    fn message(&self) -> String {
        self.to_string()
    }

    fn stack(&self) -> Option<String> {
        let backtrace = self.backtrace();
        match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        }
    }
}

/// A failure with an eagerly captured stack
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CapturedError {
    message: String,
    stack: Option<String>,
}

impl CapturedError {
    /// Create a failure, capturing the current stack regardless of `RUST_BACKTRACE`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: Some(Backtrace::force_capture().to_string()),
        }
    }

    /// Create a failure with an explicit (or absent) stack
    pub fn with_stack(message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            message: message.into(),
            stack,
        }
    }

    /// Capture a standard error, folding its source chain into the message
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(message)
    }
}

impl Failure for CapturedError {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn stack(&self) -> Option<String> {
        self.stack.clone()
    }
}
