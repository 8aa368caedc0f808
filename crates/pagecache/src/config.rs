//! Cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix the page scripts use for cache keys
pub const DEFAULT_PREFIX: &str = "cihrpt_";

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Namespace and lifetime settings for a [`TtlCache`](crate::TtlCache)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prepended to every user key
    pub prefix: String,
    /// Lifetime applied when a write does not name one
    pub default_ttl_ms: u64,
}

impl CacheConfig {
    /// Default lifetime as a [`Duration`]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl_ms: DEFAULT_TTL.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.prefix, "cihrpt_");
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"prefix":"app_"}"#).unwrap();
        assert_eq!(config.prefix, "app_");
        assert_eq!(config.default_ttl_ms, 300_000);
    }
}
