//! Error boundary
//!
//! Wraps a unit of work, catches its failure (a panic, or an `Err` for [`ErrorBoundary::guard`]),
//! records it on the logger and keeps it until [`ErrorBoundary::reset`] is called.
//! The failure is always appended to the logger before the boundary reports it as caught,
//! so anything rendering the fallback can rely on the entry being in the buffer.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logger::{panic_message, take_last_panic, Failure, Logger, Silenced};

/// Name shown for boundaries created without one
const ANONYMOUS: &str = "Anonymous";

thread_local! {
    /// Names of the boundaries currently running on this thread, outermost first
    static ACTIVE: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Marks a boundary as running; panics inside it are recorded instead of printed
struct ActiveGuard {
    _quiet: Silenced,
}

impl ActiveGuard {
    fn enter(name: &str) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(name.to_string()));
        Self {
            _quiet: Silenced::enter(),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

/// Describe the active boundaries, innermost first, optionally preceded by a location
fn component_stack(location: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(location) = location {
        lines.push(format!("    at {}", location));
    }
    ACTIVE.with(|active| {
        for name in active.borrow().iter().rev() {
            lines.push(format!("    in {}", name));
        }
    });
    lines.join("\n")
}

/// A failure caught by a boundary
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CaughtFailure {
    message: String,
    stack: Option<String>,
    component_stack: String,
}

impl CaughtFailure {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Boundaries active when the failure was caught, innermost first
    pub fn component_stack(&self) -> &str {
        &self.component_stack
    }
}

impl Failure for CaughtFailure {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn stack(&self) -> Option<String> {
        self.stack.clone()
    }
}

/// Context attached to entries recorded by a boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryContext {
    pub component_stack: Option<String>,
    pub error_boundary: bool,
}

impl From<BoundaryContext> for serde_json::Value {
    fn from(context: BoundaryContext) -> Self {
        serde_json::json!({
            "componentStack": context.component_stack,
            "errorBoundary": context.error_boundary,
        })
    }
}

type RenderFn = Box<dyn Fn(&CaughtFailure) -> String + Send + Sync>;
type ErrorHook = Box<dyn Fn(&CaughtFailure) + Send + Sync>;

/// What a boundary shows instead of its content once it has caught a failure
#[derive(Default)]
pub enum Fallback {
    /// "Something went wrong", the message and a retry hint
    #[default]
    Default,
    /// Fixed text
    Static(String),
    /// Rendered from the caught failure
    Render(RenderFn),
}

impl Fallback {
    pub fn render<F>(render: F) -> Self
    where
        F: Fn(&CaughtFailure) -> String + Send + Sync + 'static,
    {
        Fallback::Render(Box::new(render))
    }

    fn text(&self, failure: &CaughtFailure) -> String {
        match self {
            Fallback::Default => format!(
                "Something went wrong\n{}\n[Try again]",
                failure.message()
            ),
            Fallback::Static(text) => text.clone(),
            Fallback::Render(render) => render(failure),
        }
    }
}

/// Failure interceptor around a unit of work
pub struct ErrorBoundary<C = serde_json::Value> {
    logger: Arc<Logger<C>>,
    name: Option<String>,
    fallback: Fallback,
    on_error: Option<ErrorHook>,
    caught: Option<CaughtFailure>,
}

impl<C> ErrorBoundary<C>
where
    C: From<BoundaryContext> + Serialize + Clone + Send + Sync + 'static,
{
    pub fn new(logger: Arc<Logger<C>>) -> Self {
        Self {
            logger,
            name: None,
            fallback: Fallback::Default,
            on_error: None,
            caught: None,
        }
    }

    /// Name reported in the component stack and as the entry's component name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Callback invoked after a caught failure has been logged
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CaughtFailure) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Logger that receives caught failures
    pub fn logger(&self) -> &Arc<Logger<C>> {
        &self.logger
    }

    /// Run `work`, catching any panic it raises
    pub fn run<T>(&mut self, work: impl FnOnce() -> T) -> Result<T, CaughtFailure> {
        let outcome = {
            let _active = ActiveGuard::enter(self.name());
            take_last_panic();
            panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
                let site = take_last_panic().unwrap_or_default();
                CaughtFailure {
                    message: panic_message(payload.as_ref()),
                    stack: site
                        .stack
                        .or_else(|| Some(Backtrace::force_capture().to_string())),
                    component_stack: component_stack(site.location.as_deref()),
                }
            })
        };

        outcome.map_err(|failure| self.capture(failure))
    }

    /// Run fallible `work`, catching both panics and returned errors
    pub fn guard<T, E>(&mut self, work: impl FnOnce() -> Result<T, E>) -> Result<T, CaughtFailure>
    where
        E: Failure,
    {
        let name = self.name().to_string();
        match self.run(work) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                let active = ActiveGuard::enter(&name);
                let failure = CaughtFailure {
                    message: error.message(),
                    stack: error.stack(),
                    component_stack: component_stack(None),
                };
                drop(active);
                Err(self.capture(failure))
            }
            Err(failure) => Err(failure),
        }
    }

    /// Record the failure, notify the hook, then remember it
    fn capture(&mut self, failure: CaughtFailure) -> CaughtFailure {
        let context = BoundaryContext {
            component_stack: Some(failure.component_stack.clone()),
            error_boundary: true,
        };
        self.logger
            .log_error(&failure, Some(C::from(context)), self.name.as_deref());

        if let Some(hook) = &self.on_error {
            hook(&failure);
        }

        self.caught = Some(failure.clone());
        failure
    }

    pub fn has_error(&self) -> bool {
        self.caught.is_some()
    }

    pub fn error(&self) -> Option<&CaughtFailure> {
        self.caught.as_ref()
    }

    /// Fallback text while a failure is held
    pub fn fallback_text(&self) -> Option<String> {
        self.caught.as_ref().map(|failure| self.fallback.text(failure))
    }

    /// Forget the caught failure. The logger's buffer is left untouched.
    pub fn reset(&mut self) {
        self.caught = None;
    }
}
