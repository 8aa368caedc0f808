//! File-backed store
//!
//! File layout: a single append-only log (see [`crate::parser`]). The whole
//! log is replayed into memory on open; every mutation appends one record.
//! `compact()` rewrites the log with live entries only.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ahash::RandomState;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::parser::{encode_remove, encode_set, parse_header, parse_records, Record, STORE_MAGIC};
use crate::storage::{entry_size, KvStore};

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String, RandomState>,
    used: usize,
    /// Records in the log that no longer describe a live entry
    stale: usize,
}

impl Inner {
    fn apply(&mut self, record: Record<'_>) -> Result<()> {
        match record {
            Record::Set { key, value } => {
                let key = utf8(key)?;
                let value = utf8(value)?;
                self.insert(key, value);
            }
            Record::Remove { key } => {
                let key = utf8(key)?;
                self.remove(&key);
            }
        }
        Ok(())
    }

    fn insert(&mut self, key: String, value: String) {
        let size = entry_size(&key, &value);
        if let Some(old) = self.entries.insert(key.clone(), value) {
            self.used -= entry_size(&key, &old);
            self.stale += 1;
        }
        self.used += size;
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.used -= entry_size(key, &old);
                // both the set and the remove record are now dead
                self.stale += 2;
                true
            }
            None => false,
        }
    }
}

/// Log file handle and the length of its last complete record
struct Log {
    file: File,
    len: u64,
}

impl Log {
    /// Append one encoded record
    ///
    /// Bytes past the last complete record are cut off first, and a failed
    /// write is rolled back, so the log never holds a partial record ahead
    /// of good ones.
    fn append(&mut self, record: &[u8]) -> Result<()> {
        let on_disk = self.file.metadata()?.len();
        if on_disk > self.len {
            warn!("Truncating {} bytes of partial record", on_disk - self.len);
            self.file.set_len(self.len)?;
        }

        if let Err(e) = self.file.write_all(record) {
            if let Err(rollback) = self.file.set_len(self.len) {
                warn!("Could not roll back failed append: {}", rollback);
            }
            return Err(e.into());
        }

        self.len += record.len() as u64;
        Ok(())
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StorageError::Corrupt(format!("non UTF-8 record: {}", e)))
}

/// Persistent [`KvStore`] backed by an append-only log file
pub struct FileStore {
    /// Path to the log file
    path: PathBuf,

    /// Log file handle, positioned for appends
    file: Mutex<Log>,

    /// Replayed state
    inner: RwLock<Inner>,

    /// Optional byte quota over keys and values
    quota: Option<usize>,

    /// Is the store closed?
    closed: RwLock<bool>,
}

impl FileStore {
    /// Open or create a store at the given file path
    ///
    /// # Arguments
    /// * `path` - Log file path; parent directories are created
    ///
    /// # Returns
    /// * `Result<FileStore>` - Store handle with the log replayed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_quota(path, None)
    }

    /// Open or create a store that rejects writes past `quota` bytes
    pub fn open_with_quota<P: AsRef<Path>>(path: P, quota: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let (file, inner) = if path.exists() {
            Self::open_existing(path)?
        } else {
            Self::create_new(path)?
        };

        debug!(
            "Opened store {:?}: {} keys, {} stale records",
            path,
            inner.entries.len(),
            inner.stale
        );

        Ok(FileStore {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            inner: RwLock::new(inner),
            quota,
            closed: RwLock::new(false),
        })
    }

    fn open_existing(path: &Path) -> Result<(Log, Inner)> {
        let mut file = OpenOptions::new().read(true).append(true).open(path)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let body = parse_header(&buf)?;
        let (records, consumed) = parse_records(body);

        let mut inner = Inner::default();
        for record in records {
            inner.apply(record)?;
        }

        // A crash mid-append leaves a partial record; drop it so later
        // appends start on a record boundary.
        let valid_len = STORE_MAGIC.len() + consumed;
        if valid_len < buf.len() {
            warn!(
                "Discarding {} bytes of torn log tail in {:?}",
                buf.len() - valid_len,
                path
            );
            file.set_len(valid_len as u64)?;
        }

        let log = Log {
            file,
            len: valid_len as u64,
        };
        Ok((log, inner))
    }

    fn create_new(path: &Path) -> Result<(Log, Inner)> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        file.write_all(STORE_MAGIC)?;

        let log = Log {
            file,
            len: STORE_MAGIC.len() as u64,
        };
        Ok((log, Inner::default()))
    }

    fn check_open(&self) -> Result<()> {
        if *self.closed.read() {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    /// Rewrite the log so it holds exactly one set record per live key
    pub fn compact(&self) -> Result<()> {
        self.check_open()?;

        let mut inner = self.inner.write();
        let mut log = self.file.lock();

        let tmp_path = self.path.with_extension("compact");
        let mut len = STORE_MAGIC.len() as u64;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(STORE_MAGIC)?;

            let mut keys: Vec<&String> = inner.entries.keys().collect();
            keys.sort();
            for key in keys {
                let record = encode_set(key, &inner.entries[key]);
                tmp.write_all(&record)?;
                len += record.len() as u64;
            }
            tmp.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        log.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        log.len = len;

        debug!(
            "Compacted {:?}: dropped {} stale records",
            self.path, inner.stale
        );
        inner.stale = 0;

        Ok(())
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used
    }

    /// Log records that compaction would drop
    pub fn stale_records(&self) -> usize {
        self.inner.read().stale
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the store and fsync the log
    pub fn close(&self) -> Result<()> {
        if *self.closed.read() {
            return Ok(());
        }

        self.file.lock().file.sync_all()?;
        *self.closed.write() = true;

        Ok(())
    }
}

impl KvStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check_open()?;
        Ok(self.inner.read().entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check_open()?;

        let mut inner = self.inner.write();
        if let Some(limit) = self.quota {
            let previous = inner
                .entries
                .get(key)
                .map(|old| entry_size(key, old))
                .unwrap_or(0);
            let needed = inner.used - previous + entry_size(key, value);
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        self.file.lock().append(&encode_set(key, value))?;
        inner.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check_open()?;

        let mut inner = self.inner.write();
        if !inner.entries.contains_key(key) {
            return Ok(());
        }

        self.file.lock().append(&encode_remove(key))?;
        inner.remove(key);

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.check_open()?;

        let mut keys: Vec<String> = self.inner.read().entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");

        let store = FileStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.close().unwrap();

        // Reopen
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("page.store");

        let store = FileStore::open(&path).unwrap();
        store.set_item("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");

        // Write data
        {
            let store = FileStore::open(&path).unwrap();
            store.set_item("cihrpt-theme", "dark").unwrap();
            store.set_item("cihrpt_stats", "{\"data\":1}").unwrap();
            store.set_item("gone", "x").unwrap();
            store.remove_item("gone").unwrap();
            store.close().unwrap();
        }

        // Reopen and verify
        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.len(), 2);
            assert_eq!(store.get_item("cihrpt-theme").unwrap().as_deref(), Some("dark"));
            assert_eq!(store.get_item("gone").unwrap(), None);
            assert_eq!(store.stale_records(), 2);
        }
    }

    #[test]
    fn test_overwrite_counts_stale() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("page.store")).unwrap();

        store.set_item("k", "1").unwrap();
        store.set_item("k", "2").unwrap();
        store.set_item("k", "3").unwrap();

        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("3"));
        assert_eq!(store.stale_records(), 2);
    }

    #[test]
    fn test_compact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");

        {
            let store = FileStore::open(&path).unwrap();
            for i in 0..10 {
                store.set_item("k", &i.to_string()).unwrap();
            }
            store.set_item("other", "value").unwrap();
            let before = fs::metadata(&path).unwrap().len();

            store.compact().unwrap();
            assert_eq!(store.stale_records(), 0);
            assert!(fs::metadata(&path).unwrap().len() < before);

            // appends still land after compaction
            store.set_item("after", "yes").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("9"));
        assert_eq!(store.get_item("other").unwrap().as_deref(), Some("value"));
        assert_eq!(store.get_item("after").unwrap().as_deref(), Some("yes"));
        assert_eq!(store.stale_records(), 0);
    }

    #[test]
    fn test_torn_tail_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");

        {
            let store = FileStore::open(&path).unwrap();
            store.set_item("k", "v").unwrap();
        }

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"S 4 100\nhalf").unwrap();
        drop(file);

        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.len(), 1);
            store.set_item("next", "ok").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("next").unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_partial_record_mid_session_does_not_hide_later_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");

        {
            let store = FileStore::open(&path).unwrap();
            store.set_item("k1", "v1").unwrap();

            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"S 4 100\nhalf").unwrap();
            drop(file);

            store.set_item("k2", "v2").unwrap();
            store.remove_item("k1").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("k2").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get_item("k1").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalid_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.store");
        fs::write(&path, b"NOTASTORE\n").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_quota() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open_with_quota(dir.path().join("page.store"), Some(10)).unwrap();

        store.set_item("abc", "defg").unwrap();
        let result = store.set_item("hij", "klmn");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(store.used_bytes(), 7);
    }

    #[test]
    fn test_close_twice() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("page.store")).unwrap();

        store.close().unwrap();
        store.close().unwrap(); // Should not error
    }

    #[test]
    fn test_set_after_close() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("page.store")).unwrap();

        store.close().unwrap();

        let result = store.set_item("k", "v");
        assert!(matches!(result, Err(StorageError::Closed)));
    }
}
