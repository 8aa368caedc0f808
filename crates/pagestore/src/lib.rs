//! # pagestore
//!
//! Key-value storage adapters shared by the page theme controller and the
//! TTL cache.
//!
//! ## Adapters
//! - **MemoryStore**: volatile, with optional byte quota and an
//!   availability switch for exercising failure paths
//! - **FileStore**: append-only log on disk, replayed on open
//! - **WebStorage**: `window.localStorage` (wasm32 only)
//!
//! Every adapter reports failures as [`StorageError`]; callers decide which
//! ones to swallow.

#![warn(missing_docs)]

mod error;
mod file;
mod memory;
pub mod parser;
mod storage;
#[cfg(target_arch = "wasm32")]
mod web;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use storage::KvStore;
#[cfg(target_arch = "wasm32")]
pub use web::WebStorage;
