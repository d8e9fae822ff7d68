//! Logger provider scopes
//!
//! A provider makes a logger (and optionally a named-logger registry) current on this
//! thread for the duration of a closure. Scopes nest; the innermost provider wins and
//! the previous one is restored when the closure returns or unwinds.
//!
//! Asking for the current logger outside any provider is a programming error:
//! [`current`] panics, [`try_current`] returns [`Error::NoProvider`].

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;
use std::thread::LocalKey;

use serde::Serialize;

use crate::boundary::{BoundaryContext, CaughtFailure, ErrorBoundary};
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::registry::{LoggerOverrides, LoggerRegistry};

type Provided = Arc<dyn Any + Send + Sync>;

thread_local! {
    static LOGGERS: RefCell<Vec<Provided>> = const { RefCell::new(Vec::new()) };
    static REGISTRIES: RefCell<Vec<Provided>> = const { RefCell::new(Vec::new()) };
}

/// Pops one provided value when the scope ends
struct ScopeGuard(&'static LocalKey<RefCell<Vec<Provided>>>);

impl ScopeGuard {
    fn push(key: &'static LocalKey<RefCell<Vec<Provided>>>, value: Provided) -> Self {
        key.with(|stack| stack.borrow_mut().push(value));
        Self(key)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.0.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` with `logger` as the current logger
pub fn provide<C, R>(logger: Arc<Logger<C>>, f: impl FnOnce() -> R) -> R
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    let _guard = ScopeGuard::push(&LOGGERS, logger);
    f()
}

/// Run `f` with the registry's parent as the current logger and the registry available
/// for named lookups
pub fn provide_registry<C, R>(registry: Arc<LoggerRegistry<C>>, f: impl FnOnce() -> R) -> R
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    let _logger = ScopeGuard::push(&LOGGERS, Arc::clone(registry.parent()) as Provided);
    let _registry = ScopeGuard::push(&REGISTRIES, registry);
    f()
}

/// Run `f` with the boundary's logger as the current logger, inside the boundary
///
/// A panic in `f` is recorded on that logger and returned as the caught failure; the
/// provider scope is restored either way.
pub fn provide_with_boundary<C, R>(
    boundary: &mut ErrorBoundary<C>,
    f: impl FnOnce() -> R,
) -> std::result::Result<R, CaughtFailure>
where
    C: From<BoundaryContext> + Serialize + Clone + Send + Sync + 'static,
{
    let logger = Arc::clone(boundary.logger());
    provide(logger, || boundary.run(f))
}

fn top(key: &'static LocalKey<RefCell<Vec<Provided>>>) -> Option<Provided> {
    key.with(|stack| stack.borrow().last().cloned())
}

/// The innermost provided logger
pub fn try_current<C>() -> Result<Arc<Logger<C>>>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    let provided = top(&LOGGERS).ok_or(Error::NoProvider)?;
    provided
        .downcast::<Logger<C>>()
        .map_err(|_| Error::ContextTypeMismatch {
            expected: std::any::type_name::<C>(),
        })
}

/// The innermost provided logger
///
/// # Panics
///
/// Panics when called outside of [`provide`] / [`provide_registry`], or when the
/// provided logger uses a different context type.
pub fn current<C>() -> Arc<Logger<C>>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    match try_current() {
        Ok(logger) => logger,
        Err(e) => panic!("current logger must be used within a logger provider: {}", e),
    }
}

/// The named logger `name` from the innermost provided registry
pub fn named<C>(name: &str, overrides: &LoggerOverrides) -> Result<Arc<Logger<C>>>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    let provided = top(&REGISTRIES).ok_or(Error::NoRegistry)?;
    let registry = provided
        .downcast::<LoggerRegistry<C>>()
        .map_err(|_| Error::ContextTypeMismatch {
            expected: std::any::type_name::<C>(),
        })?;
    Ok(registry.get_or_create(name, overrides))
}

/// The named logger when `name` is given, otherwise the current logger
pub fn resolve<C>(name: Option<&str>, overrides: &LoggerOverrides) -> Result<Arc<Logger<C>>>
where
    C: Serialize + Clone + Send + Sync + 'static,
{
    match name {
        Some(name) if !name.is_empty() => named(name, overrides),
        _ => try_current(),
    }
}
