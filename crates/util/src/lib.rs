//! Utility helpers shared across the watchpad crates.

mod path_processing;
pub mod preferences;

pub use path_processing::expand_tilde;
pub use preferences::{PreferencesError, PreferencesPayload, UserPreferences};
