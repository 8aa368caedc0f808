//! Toggle button presentation and keyboard shortcut

use crate::theme::Theme;

/// What the toggle button shows; it always offers the *other* theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleButtonState {
    /// Icon class
    pub icon: &'static str,
    /// Visible label
    pub label: &'static str,
    /// Tooltip
    pub title: &'static str,
}

impl ToggleButtonState {
    /// Button state while `theme` is active
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => ToggleButtonState {
                icon: "fa-sun",
                label: "Light",
                title: "Switch to light theme",
            },
            Theme::Light => ToggleButtonState {
                icon: "fa-moon",
                label: "Dark",
                title: "Switch to dark theme",
            },
        }
    }
}

/// A key press with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    /// Control held
    pub ctrl: bool,
    /// Command / Windows key held
    pub meta: bool,
    /// Shift held
    pub shift: bool,
    /// Key value as reported by the platform (`"D"` with shift held)
    pub key: String,
}

impl KeyChord {
    /// Ctrl/Cmd + Shift + D
    pub fn is_toggle_theme(&self) -> bool {
        (self.ctrl || self.meta) && self.shift && self.key == "D"
    }
}
