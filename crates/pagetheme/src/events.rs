//! Synchronous publish/subscribe
//!
//! Handlers run on the emitting thread in registration order. The handler
//! list is snapshotted before dispatch, so a handler may subscribe or
//! unsubscribe without deadlocking; such changes apply from the next emit.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::theme::Theme;

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Broadcast channel for events of type `E`
///
/// Clones share the same handler list.
pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> EventBus<E> {
    /// Create a bus with no handlers
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register `handler`; it runs after every handler registered before it
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        Subscription(id)
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.handlers.len();
        registry.handlers.retain(|(id, _)| *id != subscription.0);
        registry.handlers.len() != before
    }

    /// Deliver `event` to every handler, returning how many ran
    pub fn emit(&self, event: &E) -> usize {
        let handlers: Vec<Handler<E>> = self
            .registry
            .lock()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.registry.lock().handlers.len()
    }

    /// Check if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.registry.lock().handlers.is_empty()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of the `themeChanged` notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeChanged {
    /// Theme now in effect
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |n: &u32| seen.lock().push(format!("{}:{}", tag, n)));
        }

        assert_eq!(bus.emit(&7), 3);
        assert_eq!(*seen.lock(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus: EventBus<()> = EventBus::new();
        let count = Arc::new(Mutex::new(0));

        let sub = {
            let count = Arc::clone(&count);
            bus.subscribe(move |_| *count.lock() += 1)
        };
        bus.emit(&());
        assert!(bus.unsubscribe(sub));
        assert!(!bus.unsubscribe(sub));
        bus.emit(&());

        assert_eq!(*count.lock(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus: EventBus<()> = EventBus::new();
        let inner = bus.clone();

        bus.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        assert_eq!(bus.emit(&()), 1);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_theme_changed_payload() {
        let event = ThemeChanged { theme: Theme::Dark };
        assert_eq!(serde_json::to_string(&event).unwrap(), r#"{"theme":"dark"}"#);
    }
}
