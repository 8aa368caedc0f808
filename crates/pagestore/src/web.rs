//! Browser `localStorage` adapter (wasm32 only)

use crate::error::{Result, StorageError};
use crate::storage::KvStore;

/// [`KvStore`] over `window.localStorage`
///
/// The browser reports a full store with a generic DOM exception, so any
/// failed `setItem` is mapped to [`StorageError::QuotaExceeded`] with the
/// attempted size and an unknown (zero) limit.
pub struct WebStorage {
    storage: web_sys::Storage,
}

impl WebStorage {
    /// Attach to the current window's `localStorage`
    pub fn local() -> Result<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KvStore for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|_| StorageError::QuotaExceeded {
                needed: key.len() + value.len(),
                limit: 0,
            })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let len = self.storage.length().map_err(|_| StorageError::Unavailable)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Ok(Some(key)) = self.storage.key(i) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
