//! In-memory store
//!
//! Used for tests and for hosts without persistent storage. Supports a byte
//! quota and an availability switch so callers can exercise the failure
//! paths a browser store produces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::RandomState;
use parking_lot::RwLock;

use crate::error::{Result, StorageError};
use crate::storage::{entry_size, KvStore};

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String, RandomState>,
    used: usize,
}

/// Volatile [`KvStore`] backed by a hash map
pub struct MemoryStore {
    inner: RwLock<Inner>,
    quota: Option<usize>,
    available: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store with no quota
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            quota: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create an empty store that rejects writes past `limit` bytes
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::new()
        }
    }

    /// Simulate storage being disabled (every call fails with
    /// [`StorageError::Unavailable`]) or re-enabled
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.inner.read().entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;

        let mut inner = self.inner.write();
        let previous = inner
            .entries
            .get(key)
            .map(|old| entry_size(key, old))
            .unwrap_or(0);
        let needed = inner.used - previous + entry_size(key, value);

        if let Some(limit) = self.quota {
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        inner.entries.insert(key.to_string(), value.to_string());
        inner.used = needed;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check_available()?;

        let mut inner = self.inner.write();
        if let Some(old) = inner.entries.remove(key) {
            inner.used -= entry_size(key, &old);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.check_available()?;

        let mut keys: Vec<String> = self.inner.read().entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
