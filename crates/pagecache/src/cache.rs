//! TtlCache: namespaced, time-limited entries over a KvStore

use std::time::Duration;

use pagestore::KvStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{duration_ms, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::stats::CacheStats;

/// Stored record, serialized as `{"data": .., "timestamp": .., "ttl": ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached payload
    #[serde(rename = "data")]
    pub value: Value,
    /// Write time in epoch milliseconds
    #[serde(rename = "timestamp")]
    pub written_at: i64,
    /// Lifetime in milliseconds
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// An entry is readable while `now - written_at <= ttl`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        let ttl = i64::try_from(self.ttl_ms).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.written_at) > ttl
    }

    fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Namespaced cache whose entries expire after a time-to-live
///
/// Expired and unparsable records are removed when observed, either by
/// [`get`](TtlCache::get) or by a [`cleanup`](TtlCache::cleanup) pass.
/// Storage failures never propagate to the caller.
pub struct TtlCache<S, C = SystemClock> {
    /// Underlying key-value store
    store: S,

    /// Time source for write stamps and expiry checks
    clock: C,

    /// Namespace prefix and default ttl
    config: CacheConfig,

    /// Cache statistics
    stats: CacheStats,
}

impl<S: KvStore> TtlCache<S, SystemClock> {
    /// Create a cache on the system clock without sweeping
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: KvStore, C: Clock> TtlCache<S, C> {
    /// Create a cache with an explicit clock without sweeping
    pub fn with_clock(store: S, config: CacheConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            config,
            stats: CacheStats::new(),
        }
    }

    /// Create a cache and sweep expired entries left by earlier sessions
    ///
    /// # Arguments
    /// * `store` - Backing store, possibly shared with other users
    /// * `config` - Namespace prefix and default ttl
    /// * `clock` - Time source
    pub fn open(store: S, config: CacheConfig, clock: C) -> Self {
        let cache = Self::with_clock(store, config, clock);
        cache.cleanup();
        cache
    }

    /// Store `value` under `key` for `ttl` (or the configured default)
    ///
    /// A rejected write is logged and triggers a cleanup pass; it is not
    /// retried.
    ///
    /// # Returns
    /// * `bool` - Whether the entry reached the store
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache value for '{}' is not serializable: {}", key, e);
                return false;
            }
        };

        let ttl = ttl.unwrap_or_else(|| self.config.default_ttl());
        let entry = CacheEntry {
            value,
            written_at: self.clock.now_ms(),
            ttl_ms: duration_ms(ttl) as u64,
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry '{}': {}", key, e);
                return false;
            }
        };

        match self.store.set_item(&self.namespaced(key), &raw) {
            Ok(()) => {
                self.stats.record_insert();
                true
            }
            Err(e) => {
                self.stats.record_write_failure();
                warn!("Cache write for '{}' failed ({}), clearing old data", key, e);
                self.cleanup();
                false
            }
        }
    }

    /// Read the raw JSON value under `key`
    ///
    /// Missing, expired and unparsable entries all read as `None`; the last
    /// two are removed from the store.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let full_key = self.namespaced(key);

        let raw = match self.store.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache read for '{}' failed: {}", key, e);
                self.stats.record_miss();
                return None;
            }
        };

        let Some(entry) = CacheEntry::parse(&raw) else {
            debug!("Removing unparsable cache entry '{}'", full_key);
            self.stats.record_corrupt();
            self.stats.record_miss();
            self.remove(key);
            return None;
        };

        if entry.is_expired(self.clock.now_ms()) {
            debug!("Cache entry '{}' expired", full_key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.remove(key);
            return None;
        }

        self.stats.record_hit();
        Some(entry.value)
    }

    /// Read and deserialize the value under `key`
    ///
    /// A live entry whose payload does not fit `T` reads as `None` and is
    /// left in place.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!("Cache entry '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Delete the entry under `key`
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove_item(&self.namespaced(key)) {
            warn!("Failed to remove cache entry '{}': {}", key, e);
        }
    }

    /// Remove every expired or unparsable entry under the prefix
    ///
    /// # Returns
    /// * `usize` - Number of entries removed
    pub fn cleanup(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cache cleanup could not list keys: {}", e);
                return 0;
            }
        };

        let now = self.clock.now_ms();
        let mut removed = 0;

        for key in keys.iter().filter(|k| k.starts_with(&self.config.prefix)) {
            let stale = match self.store.get_item(key) {
                Ok(Some(raw)) => CacheEntry::parse(&raw).map_or(true, |entry| entry.is_expired(now)),
                Ok(None) => false,
                Err(e) => {
                    warn!("Cache cleanup could not read '{}': {}", key, e);
                    false
                }
            };

            if stale {
                match self.store.remove_item(key) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Cache cleanup could not remove '{}': {}", key, e),
                }
            }
        }

        self.stats.record_sweep(removed);
        debug!("Cache cleanup removed {} entries", removed);
        removed
    }

    /// Full store key for a user key
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the backing store
    pub fn store(&self) -> &S {
        &self.store
    }
}
