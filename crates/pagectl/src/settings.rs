//! Settings file for pagectl
//!
//! Optional JSON document; every section and field falls back to the
//! library defaults:
//!
//! ```json
//! { "cache": { "prefix": "cihrpt_", "default_ttl_ms": 300000 },
//!   "theme": { "storage_key": "cihrpt-theme" } }
//! ```

use anyhow::{Context, Result};
use pagecache::CacheConfig;
use pagetheme::ThemeConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Combined cache and theme settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheConfig,
    pub theme: ThemeConfig,
}

impl Settings {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cache.prefix, "cihrpt_");
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagectl.json");
        fs::write(&path, r#"{"cache":{"default_ttl_ms":1000}}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.cache.default_ttl_ms, 1000);
        assert_eq!(settings.cache.prefix, "cihrpt_");
        assert_eq!(settings.theme.storage_key, "cihrpt-theme");
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagectl.json");
        fs::write(&path, "{ nope").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.json"))).is_err());
    }
}
