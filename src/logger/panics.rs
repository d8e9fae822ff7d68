//! Quiet regions for caught panics
//!
//! Panics that the crate catches itself (inside an error boundary or a subscriber
//! callback) must not reach the default panic hook, which would print over the terminal
//! UI. A chained hook records the panic site instead while the current thread is inside
//! a [`Silenced`] region. Panics anywhere else reach the previous hook unchanged.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic;
use std::sync::Once;

/// Where a silenced panic was raised
#[derive(Debug, Default)]
pub(crate) struct PanicSite {
    pub(crate) stack: Option<String>,
    pub(crate) location: Option<String>,
}

thread_local! {
    /// Depth of nested silenced regions on this thread
    static SILENCED: Cell<usize> = const { Cell::new(0) };
    /// Site of the last silenced panic on this thread
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if is_silenced() {
                let site = PanicSite {
                    stack: Some(Backtrace::force_capture().to_string()),
                    location: info.location().map(|l| l.to_string()),
                };
                LAST_PANIC.with(|last| *last.borrow_mut() = Some(site));
            } else {
                previous(info);
            }
        }));
    });
}

/// Guard marking the current thread as inside a silenced region
pub(crate) struct Silenced;

impl Silenced {
    pub(crate) fn enter() -> Self {
        install_hook();
        SILENCED.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for Silenced {
    fn drop(&mut self) {
        SILENCED.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether panics on this thread are currently recorded instead of printed
pub(crate) fn is_silenced() -> bool {
    SILENCED.with(|depth| depth.get() > 0)
}

/// Take the site of the last silenced panic on this thread
pub(crate) fn take_last_panic() -> Option<PanicSite> {
    LAST_PANIC.with(|last| last.borrow_mut().take())
}

/// Extract the message carried by a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;

    #[test]
    fn test_silenced_regions_nest() {
        assert!(!is_silenced());
        let outer = Silenced::enter();
        let inner = Silenced::enter();
        drop(inner);
        assert!(is_silenced());
        drop(outer);
        assert!(!is_silenced());
    }

    #[test]
    fn test_silenced_panic_records_site() {
        take_last_panic();
        let result = {
            let _quiet = Silenced::enter();
            panic::catch_unwind(AssertUnwindSafe(|| panic!("recorded")))
        };
        assert!(result.is_err());

        let site = take_last_panic().unwrap();
        assert!(site.location.unwrap().contains("panics.rs"));
        assert!(site.stack.is_some_and(|s| !s.is_empty()));
        assert!(take_last_panic().is_none());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
