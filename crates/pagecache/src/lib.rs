//! # pagecache
//!
//! Client-side cache helpers over a [`pagestore::KvStore`].
//!
//! ## Architecture
//! - **TtlCache**: `{data, timestamp, ttl}` JSON records under a namespace
//!   prefix; expired or corrupt records are removed when observed
//! - **Cleanup**: prefix sweep at open and whenever a write is rejected
//! - **Dedupe**: identical in-flight requests share one result
//! - **Gates**: debounce and throttle driven by an injectable [`Clock`]

#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod dedupe;
mod gate;
mod stats;

pub use cache::{CacheEntry, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_PREFIX, DEFAULT_TTL};
pub use dedupe::{request_key, Dedupe, InFlight};
pub use gate::{Debounce, Throttle};
pub use stats::CacheStats;
