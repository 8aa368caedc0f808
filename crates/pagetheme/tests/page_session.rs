//! Theme and cache sharing one persistent store across page loads

use std::sync::Arc;
use std::time::Duration;

use pagecache::{CacheConfig, ManualClock, TtlCache};
use pagestore::{FileStore, KvStore};
use pagetheme::{
    track_ambient, AmbientSignal, ChartDefaults, MemoryDocument, Theme, ThemeConfig,
    ThemeController,
};
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_manual_choice_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("page.store");

    // First visit: system is dark, user picks light
    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let mut controller =
            ThemeController::new(Arc::clone(&store), MemoryDocument::new(), ThemeConfig::default());
        assert_eq!(controller.init(&AmbientSignal::new(true)), Theme::Dark);
        controller.set_theme(Theme::Light);
    }

    // Second visit: the stored choice wins over the platform
    let store = Arc::new(FileStore::open(&path).unwrap());
    let document = Arc::new(MemoryDocument::new());
    let mut controller =
        ThemeController::new(Arc::clone(&store), Arc::clone(&document), ThemeConfig::default());
    assert_eq!(controller.init(&AmbientSignal::new(true)), Theme::Light);
    assert_eq!(document.root_attribute("data-theme").as_deref(), Some("light"));
    assert!(!controller.on_ambient_change(true));
}

#[test]
fn test_cache_sweep_leaves_theme_alone() {
    let store = Arc::new(pagestore::MemoryStore::new());
    let clock = Arc::new(ManualClock::new(0));

    let mut controller =
        ThemeController::new(Arc::clone(&store), MemoryDocument::new(), ThemeConfig::default());
    controller.init(&AmbientSignal::unavailable());
    controller.set_theme(Theme::Dark);

    let cache = TtlCache::with_clock(Arc::clone(&store), CacheConfig::default(), Arc::clone(&clock));
    cache.set("statistics", &json!({"total": 3}), Some(Duration::from_millis(10)));
    clock.advance(Duration::from_millis(11));

    assert_eq!(cache.cleanup(), 1);
    assert_eq!(store.get_item("cihrpt-theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn test_ambient_tracking_drives_chart_palette() {
    let signal = AmbientSignal::new(false);
    let mut controller = ThemeController::new(
        pagestore::MemoryStore::new(),
        MemoryDocument::new(),
        ThemeConfig::default(),
    );
    let (charts, _) = ChartDefaults::attach(controller.events(), controller.theme());
    controller.init(&signal);

    let shared = Arc::new(Mutex::new(controller));
    track_ambient(&shared, &signal);

    signal.set(true);
    assert_eq!(charts.palette().background, "#1e293b");

    shared.lock().toggle_theme();
    assert_eq!(charts.palette().background, "#ffffff");

    // manual choice is stored, platform changes no longer apply
    signal.set(false);
    signal.set(true);
    assert_eq!(charts.palette().background, "#ffffff");
}
