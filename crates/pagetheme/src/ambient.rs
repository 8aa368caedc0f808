//! Platform dark-mode preference signal

use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{EventBus, Subscription};

/// Observable "prefers dark" reading from the platform
///
/// `None` means the platform exposes no preference. Clones share state and
/// subscribers.
#[derive(Clone, Default)]
pub struct AmbientSignal {
    prefers_dark: Arc<RwLock<Option<bool>>>,
    changes: EventBus<bool>,
}

impl AmbientSignal {
    /// Signal with a known initial reading
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            prefers_dark: Arc::new(RwLock::new(Some(prefers_dark))),
            changes: EventBus::new(),
        }
    }

    /// Signal for a platform that reports no preference
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Current reading
    pub fn prefers_dark(&self) -> Option<bool> {
        *self.prefers_dark.read()
    }

    /// Record a new reading; subscribers run only if it differs
    pub fn set(&self, prefers_dark: bool) {
        let previous = self.prefers_dark.write().replace(prefers_dark);
        if previous != Some(prefers_dark) {
            self.changes.emit(&prefers_dark);
        }
    }

    /// Run `handler` on every change
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.changes.subscribe(move |prefers_dark: &bool| handler(*prefers_dark))
    }

    /// Stop delivering changes to a handler
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.changes.unsubscribe(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_change_notifications() {
        let signal = AmbientSignal::new(false);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sub = {
            let seen = Arc::clone(&seen);
            signal.subscribe(move |dark| seen.lock().push(dark))
        };

        signal.set(false); // unchanged
        signal.set(true);
        signal.unsubscribe(sub);
        signal.set(false);

        assert_eq!(*seen.lock(), vec![true]);
        assert_eq!(signal.prefers_dark(), Some(false));
    }

    #[test]
    fn test_unavailable() {
        let signal = AmbientSignal::unavailable();
        assert_eq!(signal.prefers_dark(), None);
    }
}
