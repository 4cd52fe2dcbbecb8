//! Theme styling for the TUI.
//!
//! Two palettes (Dracula, Nord), semantic theme roles, and helper builders
//! for Ratatui widgets and styles. Prefer these helpers over hard-coding
//! colors.

use std::env;

use tracing::debug;

pub mod dracula;
pub mod nord;
pub mod roles;
pub mod theme_helpers;

pub use dracula::DraculaTheme;
pub use nord::NordTheme;
pub use roles::Theme;

/// Environment variable selecting a theme by name.
pub const THEME_ENV: &str = "TUI_THEME";

/// Theme plus the canonical id it was resolved from.
#[derive(Debug)]
pub struct LoadedTheme {
    pub id: &'static str,
    pub theme: Box<dyn Theme>,
}

/// Selects a theme from `TUI_THEME`, then the persisted preference, then the default.
pub fn load(preferred_theme: Option<&str>) -> LoadedTheme {
    if let Ok(theme_name) = env::var(THEME_ENV)
        && let Some(loaded) = resolve(theme_name.trim())
    {
        return loaded;
    }

    if let Some(name) = preferred_theme
        && let Some(loaded) = resolve(name.trim())
    {
        return loaded;
    }

    debug!("No theme override found; using dracula");
    LoadedTheme {
        id: "dracula",
        theme: Box::new(DraculaTheme::new()),
    }
}

/// Resolve a theme by (case-insensitive) name.
pub fn resolve(name: &str) -> Option<LoadedTheme> {
    match name.to_ascii_lowercase().as_str() {
        "dracula" => Some(LoadedTheme {
            id: "dracula",
            theme: Box::new(DraculaTheme::new()),
        }),
        "nord" => Some(LoadedTheme {
            id: "nord",
            theme: Box::new(NordTheme::new()),
        }),
        _ => None,
    }
}
