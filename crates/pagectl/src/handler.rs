//! Command handler for pagectl

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pagecache::{Clock, SystemClock, TtlCache};
use pagestore::{FileStore, KvStore};
use pagetheme::{AmbientSignal, MemoryDocument, Theme, ThemeController, THEME_COLOR_META};
use serde_json::Value;
use tracing::warn;

use crate::settings::Settings;

/// Theme subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Set(String),
    Toggle,
}

/// Cache subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    Set {
        key: String,
        value: String,
        ttl_ms: Option<u64>,
    },
    Get(String),
    Remove(String),
    Cleanup,
}

pub struct CommandHandler<C = SystemClock> {
    store: Arc<FileStore>,
    cache: TtlCache<Arc<FileStore>, C>,
    theme: ThemeController<Arc<FileStore>>,
    document: Arc<MemoryDocument>,
    ambient: AmbientSignal,
}

impl CommandHandler<SystemClock> {
    pub fn new(store: Arc<FileStore>, settings: &Settings, ambient: AmbientSignal) -> Self {
        Self::with_clock(store, settings, ambient, SystemClock)
    }
}

impl<C: Clock> CommandHandler<C> {
    pub fn with_clock(store: Arc<FileStore>, settings: &Settings, ambient: AmbientSignal, clock: C) -> Self {
        let cache = TtlCache::open(Arc::clone(&store), settings.cache.clone(), clock);

        let document = Arc::new(MemoryDocument::new());
        let mut theme = ThemeController::new(Arc::clone(&store), Arc::clone(&document), settings.theme.clone());
        theme.init(&ambient);

        Self {
            store,
            cache,
            theme,
            document,
            ambient,
        }
    }

    pub fn handle_theme(&mut self, action: ThemeAction) -> String {
        match action {
            ThemeAction::Show => {}
            ThemeAction::Set(value) => {
                if !self.theme.set_theme_str(&value) {
                    warn!("Ignoring unknown theme '{}'", value);
                }
            }
            ThemeAction::Toggle => {
                self.theme.toggle_theme();
            }
        }
        self.describe_theme()
    }

    pub fn handle_cache(&self, action: CacheAction) -> String {
        match action {
            CacheAction::Set { key, value, ttl_ms } => {
                // bare words are stored as JSON strings
                let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
                let ttl = ttl_ms.map(Duration::from_millis);
                if self.cache.set(&key, &value, ttl) {
                    format!("stored {}", self.cache.namespaced(&key))
                } else {
                    format!("not stored {} (see log)", self.cache.namespaced(&key))
                }
            }
            CacheAction::Get(key) => match self.cache.get_value(&key) {
                Some(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
                None => "(absent)".to_string(),
            },
            CacheAction::Remove(key) => {
                self.cache.remove(&key);
                format!("removed {}", self.cache.namespaced(&key))
            }
            CacheAction::Cleanup => {
                let removed = self.cache.cleanup();
                format!("removed {} expired entries", removed)
            }
        }
    }

    pub fn handle_compact(&self) -> Result<String> {
        self.store.compact().context("Failed to compact store")?;
        let keys = self.store.keys().context("Failed to list keys")?;
        Ok(format!("compacted {:?}: {} keys", self.store.path(), keys.len()))
    }

    fn describe_theme(&self) -> String {
        let theme = self.theme.theme();
        let source = self.theme_source();
        let button = self.theme.button_state();
        let color = self
            .document
            .meta(THEME_COLOR_META)
            .unwrap_or_else(|| theme.meta_color().to_string());

        format!(
            "theme:       {} ({})\ntheme-color: {}\ntoggle:      {} ({})",
            theme, source, color, button.label, button.title
        )
    }

    fn theme_source(&self) -> &'static str {
        let stored = self.theme.saved_theme(None);
        if self.theme.has_manual_choice() && stored == self.theme.theme() {
            "stored"
        } else if self.ambient.prefers_dark().is_some() {
            "ambient"
        } else {
            "default"
        }
    }

    /// Current theme, for callers that need the value rather than text
    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecache::ManualClock;
    use tempfile::TempDir;

    fn handler(dir: &TempDir, prefers_dark: Option<bool>, clock: Arc<ManualClock>) -> CommandHandler<Arc<ManualClock>> {
        let store = Arc::new(FileStore::open(dir.path().join("page.store")).unwrap());
        let ambient = match prefers_dark {
            Some(dark) => AmbientSignal::new(dark),
            None => AmbientSignal::unavailable(),
        };
        CommandHandler::with_clock(store, &Settings::default(), ambient, clock)
    }

    #[test]
    fn test_theme_show_sources() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(0));

        let mut h = handler(&dir, None, Arc::clone(&clock));
        assert!(h.handle_theme(ThemeAction::Show).starts_with("theme:       light (default)"));

        let mut h = handler(&dir, Some(true), Arc::clone(&clock));
        let out = h.handle_theme(ThemeAction::Show);
        assert!(out.starts_with("theme:       dark (ambient)"));
        assert!(out.contains("#0f172a"));

        let out = h.handle_theme(ThemeAction::Toggle);
        assert!(out.starts_with("theme:       light (stored)"));
        assert!(out.contains("toggle:      Dark"));
    }

    #[test]
    fn test_theme_set_persists_across_runs() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(0));

        {
            let mut h = handler(&dir, Some(false), Arc::clone(&clock));
            h.handle_theme(ThemeAction::Set("dark".to_string()));
        }

        let h = handler(&dir, Some(false), clock);
        assert_eq!(h.theme(), Theme::Dark);
    }

    #[test]
    fn test_theme_set_invalid_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, None, Arc::new(ManualClock::new(0)));

        let out = h.handle_theme(ThemeAction::Set("blue".to_string()));
        assert!(out.starts_with("theme:       light (default)"));
    }

    #[test]
    fn test_cache_commands() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let h = handler(&dir, None, Arc::clone(&clock));

        let out = h.handle_cache(CacheAction::Set {
            key: "stats".to_string(),
            value: r#"{"a":1}"#.to_string(),
            ttl_ms: Some(1000),
        });
        assert_eq!(out, "stored cihrpt_stats");
        assert!(h.handle_cache(CacheAction::Get("stats".to_string())).contains("\"a\": 1"));

        h.handle_cache(CacheAction::Set {
            key: "word".to_string(),
            value: "hello".to_string(),
            ttl_ms: Some(10),
        });
        assert_eq!(h.handle_cache(CacheAction::Get("word".to_string())), "\"hello\"");

        clock.advance(Duration::from_millis(11));
        assert_eq!(h.handle_cache(CacheAction::Cleanup), "removed 1 expired entries");
        assert_eq!(h.handle_cache(CacheAction::Get("word".to_string())), "(absent)");

        h.handle_cache(CacheAction::Remove("stats".to_string()));
        assert_eq!(h.handle_cache(CacheAction::Get("stats".to_string())), "(absent)");
    }

    #[test]
    fn test_compact() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, None, Arc::new(ManualClock::new(0)));

        h.handle_theme(ThemeAction::Toggle);
        h.handle_theme(ThemeAction::Toggle);
        let out = h.handle_compact().unwrap();
        assert!(out.ends_with("1 keys"));
    }
}
