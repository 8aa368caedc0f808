//! Input pacing: debounce and throttle over a [`Clock`]
//!
//! Both gates are polled rather than timer driven, so the host decides when
//! to check them (animation frame, input event, scroll tick).

use std::time::Duration;

use crate::clock::{duration_ms, Clock};

/// Releases the latest value once `wait` has passed with no new input
pub struct Debounce<T, C> {
    clock: C,
    wait_ms: i64,
    pending: Option<(T, i64)>,
}

impl<T, C: Clock> Debounce<T, C> {
    /// Create a gate with the given quiet period
    pub fn new(clock: C, wait: Duration) -> Self {
        Self {
            clock,
            wait_ms: duration_ms(wait),
            pending: None,
        }
    }

    /// Record new input, replacing anything pending and restarting the wait
    pub fn call(&mut self, value: T) {
        let due = self.clock.now_ms().saturating_add(self.wait_ms);
        self.pending = Some((value, due));
    }

    /// Take the pending value if its quiet period has elapsed
    pub fn poll(&mut self) -> Option<T> {
        match self.pending {
            Some((_, due)) if self.clock.now_ms() >= due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Whether input is waiting to be released
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Lets a call through at most once per `limit`
pub struct Throttle<C> {
    clock: C,
    limit_ms: i64,
    last: Option<i64>,
}

impl<C: Clock> Throttle<C> {
    /// Create a gate with the given minimum spacing
    pub fn new(clock: C, limit: Duration) -> Self {
        Self {
            clock,
            limit_ms: duration_ms(limit),
            last: None,
        }
    }

    /// Returns `true` if the call may run now
    pub fn ready(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.last {
            Some(last) if now.saturating_sub(last) < self.limit_ms => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
