//! Live subscriptions to newly appended entries

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use anyhow::Result;

use super::entry::LogEntry;
use super::panics::{self, panic_message, Silenced};
use super::targets;

/// Receiver of every entry appended after registration
///
/// Plain closures `Fn(&LogEntry<C>)` implement this trait. Wrap a closure returning
/// `Result` in [`Fallible`] to report failures instead of panicking.
pub trait LogSubscriber<C>: Send + Sync {
    fn on_entry(&self, entry: &LogEntry<C>) -> Result<()>;
}

impl<C, F> LogSubscriber<C> for F
where
    F: Fn(&LogEntry<C>) + Send + Sync,
{
    fn on_entry(&self, entry: &LogEntry<C>) -> Result<()> {
        self(entry);
        Ok(())
    }
}

/// Adapter for closures that can fail
pub struct Fallible<F>(pub F);

impl<C, F> LogSubscriber<C> for Fallible<F>
where
    F: Fn(&LogEntry<C>) -> Result<()> + Send + Sync,
{
    fn on_entry(&self, entry: &LogEntry<C>) -> Result<()> {
        (self.0)(entry)
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

/// Registered subscribers of one logger
pub(crate) struct SubscriberSet<C> {
    subscribers: Mutex<Vec<(u64, Arc<dyn LogSubscriber<C>>)>>,
    next_id: AtomicU64,
}

impl<C: 'static> SubscriberSet<C> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a subscriber and hand back its removal handle
    pub(crate) fn add(self: &Arc<Self>, subscriber: Arc<dyn LogSubscriber<C>>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push((id, subscriber));
        }
        let set: Arc<dyn Detach> = self.clone();
        Subscription {
            set: Arc::downgrade(&set),
            id,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Invoke every subscriber exactly once with `entry`
    ///
    /// The registry lock is released before any callback runs, so subscribers may log
    /// or unsubscribe re-entrantly. Failures and panics are reported and swallowed.
    pub(crate) fn notify(&self, entry: &LogEntry<C>) {
        let snapshot: Vec<Arc<dyn LogSubscriber<C>>> = self
            .subscribers
            .lock()
            .map(|s| s.iter().map(|(_, sub)| Arc::clone(sub)).collect())
            .unwrap_or_default();

        for subscriber in snapshot {
            let outcome = {
                let _quiet = Silenced::enter();
                panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_entry(entry)))
            };
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(target: targets::DIAGNOSTICS, "Log subscriber error: {:#}", e);
                }
                Err(payload) => {
                    panics::take_last_panic();
                    tracing::error!(
                        target: targets::DIAGNOSTICS,
                        "Log subscriber error: panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

impl<C: 'static> Detach for SubscriberSet<C> {
    fn detach(&self, id: u64) -> bool {
        match self.subscribers.lock() {
            Ok(mut subscribers) => {
                let before = subscribers.len();
                subscribers.retain(|(sub_id, _)| *sub_id != id);
                subscribers.len() != before
            }
            Err(_) => false,
        }
    }
}

/// Handle returned by [`Logger::subscribe`](super::Logger::subscribe)
///
/// Dropping the handle keeps the subscription alive; call [`unsubscribe`](Self::unsubscribe)
/// to remove it. Unsubscribing more than once has no further effect.
pub struct Subscription {
    set: Weak<dyn Detach>,
    id: u64,
}

impl Subscription {
    /// Remove the subscriber. Returns true only on the call that actually removed it.
    pub fn unsubscribe(&self) -> bool {
        self.set
            .upgrade()
            .map(|set| set.detach(self.id))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
