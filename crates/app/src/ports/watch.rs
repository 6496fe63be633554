//! Watch port — host-level state-change observation per entity.
//!
//! The subscription manager establishes one watch per entity that has at
//! least one listener, and keeps the returned guard for as long as that
//! holds. Dropping the guard cancels the watch, so active host watches are
//! bounded by distinct subscribed entities.

use std::fmt;
use std::sync::Arc;

use dashview_domain::id::EntityKey;

/// Asks the host to deliver state-change events for individual entities.
pub trait EntityWatcher {
    /// Begin watching `key`; the watch stays active until the returned
    /// guard is dropped.
    fn watch(&self, key: &EntityKey) -> WatchGuard;
}

impl<T: EntityWatcher + Send + Sync> EntityWatcher for Arc<T> {
    fn watch(&self, key: &EntityKey) -> WatchGuard {
        (**self).watch(key)
    }
}

/// Cancellation handle for one host-level watch. Dropping it cancels the
/// watch.
pub struct WatchGuard {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl WatchGuard {
    /// Guard that runs `cancel` when dropped.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Guard that does nothing on drop, for hosts without per-entity
    /// teardown.
    #[must_use]
    pub fn noop() -> Self {
        Self { cancel: None }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("cancels", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn should_run_cancel_exactly_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guard = WatchGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_do_nothing_for_noop_guard() {
        let guard = WatchGuard::noop();
        drop(guard);
    }
}
