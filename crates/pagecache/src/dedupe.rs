//! Request de-duplication
//!
//! Identical requests issued while one is already in flight share its
//! result instead of hitting the network twice. The slot is released as
//! soon as the request settles, so later calls start a fresh request.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

/// Handle to a possibly shared in-flight request
pub type InFlight<T> = Shared<BoxFuture<'static, T>>;

type Slots<K, T> = Arc<Mutex<HashMap<K, InFlight<T>, RandomState>>>;

/// Coalesces concurrent requests with equal keys
pub struct Dedupe<K, T> {
    inflight: Slots<K, T>,
}

impl<K, T> Dedupe<K, T>
where
    K: Hash + Eq + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    /// Join the in-flight request for `key`, or start one with `start`
    ///
    /// `start` is only called when nothing is in flight for `key`.
    pub fn run<F, Fut>(&self, key: K, start: F) -> InFlight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        if let Some(existing) = self.inflight.lock().get(&key) {
            trace!("Joining in-flight request");
            return existing.clone();
        }

        // `start` may issue further requests through this registry
        let request = start();

        let slots = Arc::clone(&self.inflight);
        let release = key.clone();
        let shared = async move {
            let output = request.await;
            slots.lock().remove(&release);
            output
        }
        .boxed()
        .shared();

        let mut inflight = self.inflight.lock();
        if let Some(existing) = inflight.get(&key) {
            trace!("Request started elsewhere meanwhile, joining it");
            return existing.clone();
        }
        inflight.insert(key, shared.clone());
        shared
    }

    /// Number of requests currently in flight
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<K, T> Default for Dedupe<K, T>
where
    K: Hash + Eq + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Key two fetches share when both URL and options match
pub fn request_key(url: &str, options: &Value) -> String {
    format!("{}_{}", url, options)
}
