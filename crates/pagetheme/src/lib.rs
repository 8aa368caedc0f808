//! # pagetheme
//!
//! Light/dark theme state for a page, persisted in a [`pagestore::KvStore`].
//!
//! ```rust,ignore
//! use pagetheme::{AmbientSignal, MemoryDocument, ThemeConfig, ThemeController};
//! use pagestore::MemoryStore;
//!
//! let mut controller = ThemeController::new(MemoryStore::new(), MemoryDocument::new(), ThemeConfig::default());
//! controller.init(&AmbientSignal::new(true));
//! controller.toggle_theme();
//! ```
//!
//! ## Pieces
//! - [`ThemeController`]: set/toggle/get, persistence, ambient tracking
//! - [`EventBus`]: `themeChanged` fan-out in registration order
//! - [`ChartDefaults`]: chart palette that follows the theme
//! - [`DocumentHook`]: `data-theme` attribute and `theme-color` meta tag

#![warn(missing_docs)]

mod ambient;
mod chart;
mod controller;
mod controls;
mod document;
mod events;
mod theme;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use ambient::AmbientSignal;
pub use chart::{ChartDefaults, ChartPalette, ChartSurface};
pub use controller::{track_ambient, SharedThemeController, ThemeController};
pub use controls::{KeyChord, ToggleButtonState};
pub use document::{DocumentHook, MemoryDocument};
pub use events::{EventBus, Subscription, ThemeChanged};
pub use theme::{
    ParseThemeError, Theme, ThemeConfig, THEME_ATTRIBUTE, THEME_COLOR_META, THEME_STORAGE_KEY,
};
