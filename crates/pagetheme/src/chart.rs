//! Chart colors that follow the theme

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::events::{EventBus, Subscription, ThemeChanged};
use crate::theme::Theme;

/// Default colors handed to chart widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPalette {
    /// Labels and tick text
    pub text: &'static str,
    /// Axis and series borders
    pub border: &'static str,
    /// Plot background
    pub background: &'static str,
    /// Linear and category grid lines
    pub grid: &'static str,
}

impl ChartPalette {
    /// Palette for `theme`
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => ChartPalette {
                text: "#e2e8f0",
                border: "#334155",
                background: "#1e293b",
                grid: "#334155",
            },
            Theme::Light => ChartPalette {
                text: "#4b5563",
                border: "#e5e7eb",
                background: "#ffffff",
                grid: "#f3f4f6",
            },
        }
    }
}

/// Live chart that can be redrawn with the current defaults
pub trait ChartSurface {
    /// Redraw; `animate` is `false` for theme switches
    fn refresh(&self, animate: bool);
}

/// Current chart defaults, kept in step with `themeChanged`
#[derive(Clone)]
pub struct ChartDefaults {
    palette: Arc<RwLock<ChartPalette>>,
}

impl ChartDefaults {
    /// Start from `theme` and follow every change published on `events`
    pub fn attach(events: &EventBus<ThemeChanged>, theme: Theme) -> (Self, Subscription) {
        let defaults = ChartDefaults {
            palette: Arc::new(RwLock::new(ChartPalette::for_theme(theme))),
        };

        let palette = Arc::clone(&defaults.palette);
        let subscription = events.subscribe(move |event: &ThemeChanged| {
            trace!("Chart defaults follow {}", event.theme);
            *palette.write() = ChartPalette::for_theme(event.theme);
        });

        (defaults, subscription)
    }

    /// Palette in effect
    pub fn palette(&self) -> ChartPalette {
        *self.palette.read()
    }
}
