//! Error types for pagestore

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures reported by a [`KvStore`](crate::KvStore) adapter
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is disabled or not reachable (private mode, blocked cookies)
    #[error("storage unavailable")]
    Unavailable,

    /// The write would push the store past its byte quota
    #[error("quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        /// Bytes the store would hold after the write
        needed: usize,
        /// Configured byte limit
        limit: usize,
    },

    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// On-disk log could not be parsed
    #[error("corrupt store: {0}")]
    Corrupt(String),

    /// Store has been closed
    #[error("store is closed")]
    Closed,
}

impl StorageError {
    /// Whether the error means the store is full
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for StorageError {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        StorageError::Corrupt(format!("{:?}", err))
    }
}
