//! Theme state controller
//!
//! Owns the active theme and keeps three things in step with it: the
//! persisted preference, the document styling hook, and `themeChanged`
//! subscribers.
//!
//! Lookup order at startup: persisted value, then the ambient platform
//! preference, then light. Only manual choices (`set_theme`, `toggle_theme`,
//! the keyboard chord) are persisted. While nothing is persisted the
//! controller follows ambient preference changes; the first manual choice
//! ends that for as long as the stored value exists.

use std::sync::Arc;

use pagestore::KvStore;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::ambient::AmbientSignal;
use crate::chart::ChartSurface;
use crate::controls::{KeyChord, ToggleButtonState};
use crate::document::DocumentHook;
use crate::events::{EventBus, Subscription, ThemeChanged};
use crate::theme::{Theme, ThemeConfig, THEME_ATTRIBUTE, THEME_COLOR_META};

/// Owner of the page's light/dark state
pub struct ThemeController<S> {
    /// Preference storage
    store: S,

    /// Styling hook the theme is mirrored into
    document: Box<dyn DocumentHook + Send + Sync>,

    /// Key the preference is persisted under
    storage_key: String,

    /// Active theme
    current: Theme,

    /// `themeChanged` subscribers
    events: EventBus<ThemeChanged>,

    /// Charts redrawn after a manual switch
    charts: Vec<Box<dyn ChartSurface + Send + Sync>>,

    /// Toggle button presentation
    button: ToggleButtonState,
}

impl<S: KvStore> ThemeController<S> {
    /// Create a controller. Nothing is rendered until [`init`](Self::init).
    pub fn new<D>(store: S, document: D, config: ThemeConfig) -> Self
    where
        D: DocumentHook + Send + Sync + 'static,
    {
        Self {
            store,
            document: Box::new(document),
            storage_key: config.storage_key,
            current: Theme::default(),
            events: EventBus::new(),
            charts: Vec::new(),
            button: ToggleButtonState::for_theme(Theme::default()),
        }
    }

    /// Resolve the starting theme and render it without persisting
    pub fn init(&mut self, ambient: &AmbientSignal) -> Theme {
        let theme = self.saved_theme(ambient.prefers_dark());
        debug!("Starting with {} theme", theme);
        self.render(theme);
        self.button = ToggleButtonState::for_theme(theme);
        theme
    }

    /// Persisted theme, else the ambient preference, else light
    ///
    /// Storage failures and unrecognized stored values count as no
    /// preference.
    pub fn saved_theme(&self, prefers_dark: Option<bool>) -> Theme {
        match self.store.get_item(&self.storage_key) {
            Ok(Some(stored)) => {
                if let Ok(theme) = stored.parse::<Theme>() {
                    return theme;
                }
                debug!("Ignoring unrecognized stored theme '{}'", stored);
            }
            Ok(None) => {}
            Err(e) => debug!("Theme preference unreadable: {}", e),
        }

        Theme::from_prefers_dark(prefers_dark.unwrap_or(false))
    }

    /// Make `theme` active, persist it, and notify subscribers
    ///
    /// A failed persist is logged; the theme still applies for this session.
    pub fn apply_theme(&mut self, theme: Theme) {
        if let Err(e) = self.store.set_item(&self.storage_key, theme.as_str()) {
            warn!("Could not persist theme preference: {}", e);
        }
        self.render(theme);
    }

    /// Manual switch: apply, then refresh dependent visuals
    pub fn set_theme(&mut self, theme: Theme) {
        self.apply_theme(theme);
        self.refresh_dependents();
    }

    /// [`set_theme`](Self::set_theme) from text; anything other than exactly
    /// `light` or `dark` is ignored
    ///
    /// # Returns
    /// * `bool` - Whether the input was accepted
    pub fn set_theme_str(&mut self, value: &str) -> bool {
        match value.parse::<Theme>() {
            Ok(theme) => {
                self.set_theme(theme);
                true
            }
            Err(_) => false,
        }
    }

    /// Flip light and dark
    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.current.toggled();
        self.set_theme(next);
        next
    }

    /// Follow an ambient preference change unless a manual choice is stored
    ///
    /// # Returns
    /// * `bool` - Whether the controller followed the change
    pub fn on_ambient_change(&mut self, prefers_dark: bool) -> bool {
        if self.has_manual_choice() {
            debug!("Ambient change ignored: manual theme choice is stored");
            return false;
        }

        let theme = Theme::from_prefers_dark(prefers_dark);
        debug!("Following ambient preference to {}", theme);
        self.render(theme);
        self.refresh_dependents();
        true
    }

    /// Toggle on Ctrl/Cmd + Shift + D
    ///
    /// # Returns
    /// * `bool` - Whether the chord was consumed (caller should suppress the
    ///   default action)
    pub fn handle_key(&mut self, chord: &KeyChord) -> bool {
        if !chord.is_toggle_theme() {
            return false;
        }
        self.toggle_theme();
        true
    }

    /// Whether any value is stored under the preference key
    pub fn has_manual_choice(&self) -> bool {
        match self.store.get_item(&self.storage_key) {
            Ok(stored) => stored.is_some(),
            Err(e) => {
                debug!("Theme preference unreadable: {}", e);
                false
            }
        }
    }

    /// Register a chart to redraw after theme switches
    pub fn add_chart<C>(&mut self, chart: C)
    where
        C: ChartSurface + Send + Sync + 'static,
    {
        self.charts.push(Box::new(chart));
    }

    /// Active theme
    pub fn theme(&self) -> Theme {
        self.current
    }

    /// Check if the dark theme is active
    pub fn is_dark(&self) -> bool {
        self.current == Theme::Dark
    }

    /// Check if the light theme is active
    pub fn is_light(&self) -> bool {
        self.current == Theme::Light
    }

    /// Toggle button presentation for the active theme
    pub fn button_state(&self) -> ToggleButtonState {
        self.button
    }

    /// `themeChanged` channel
    pub fn events(&self) -> &EventBus<ThemeChanged> {
        &self.events
    }

    /// Get the preference store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn render(&mut self, theme: Theme) {
        self.current = theme;
        self.document.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        self.document.set_meta(THEME_COLOR_META, theme.meta_color());
        self.events.emit(&ThemeChanged { theme });
    }

    fn refresh_dependents(&mut self) {
        self.button = ToggleButtonState::for_theme(self.current);
        for chart in &self.charts {
            chart.refresh(false);
        }
    }
}

/// Controller shared between the page and platform callbacks
pub type SharedThemeController<S> = Arc<Mutex<ThemeController<S>>>;

/// Route `signal` changes into `controller`
///
/// The subscription locks the controller, so `themeChanged` handlers must
/// not call back into the same controller.
pub fn track_ambient<S>(controller: &SharedThemeController<S>, signal: &AmbientSignal) -> Subscription
where
    S: KvStore + Send + 'static,
{
    let controller = Arc::clone(controller);
    signal.subscribe(move |prefers_dark| {
        controller.lock().on_ambient_change(prefers_dark);
    })
}
