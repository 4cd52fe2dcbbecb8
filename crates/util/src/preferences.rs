//! User preference persistence for watchpad.
//!
//! A tiny JSON-backed store that records lightweight configuration: the
//! preferred theme, the delay before focus moves into a freshly opened row
//! editor, and the persisted watch list. The file lives in the standard
//! configuration directory (`~/.config/watchpad/preferences.json` on most
//! platforms) unless `WATCHPAD_PREFERENCES_PATH` points elsewhere.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "WATCHPAD_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Delay before a row editor receives focus, giving it one frame to mount.
pub const DEFAULT_FOCUS_DELAY_MS: u64 = 16;

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted preference values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesPayload {
    /// Canonical identifier of the preferred theme.
    pub preferred_theme: Option<String>,
    /// Milliseconds to wait before focusing a row editor.
    pub focus_delay_ms: u64,
    /// Watch expressions, in display order.
    pub watch_expressions: Vec<String>,
}

impl Default for PreferencesPayload {
    fn default() -> Self {
        Self {
            preferred_theme: None,
            focus_delay_ms: DEFAULT_FOCUS_DELAY_MS,
            watch_expressions: Vec::new(),
        }
    }
}

/// Thread-safe preferences store backed by a JSON file.
#[derive(Debug, Default)]
pub struct UserPreferences {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
    persist_to_disk: bool,
}

impl UserPreferences {
    /// Load the store from the default location (or the env override).
    pub fn new() -> Result<Self, PreferencesError> {
        Self::at_path(default_preferences_path())
    }

    /// Load the store rooted at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let payload = load_payload(&path)?;
        Ok(Self {
            path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used when the config directory cannot be
    /// accessed or persistence is switched off.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PreferencesPayload::default()),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn persists_to_disk(&self) -> bool {
        self.persist_to_disk
    }

    /// Returns the canonical identifier of the preferred theme, if one was saved.
    pub fn preferred_theme(&self) -> Option<String> {
        self.lock().preferred_theme.clone()
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.lock().focus_delay_ms)
    }

    /// The persisted watch list, in display order.
    pub fn watch_expressions(&self) -> Vec<String> {
        self.lock().watch_expressions.clone()
    }

    /// Persist a new preferred theme identifier.
    pub fn set_preferred_theme(&self, theme_id: Option<String>) -> Result<(), PreferencesError> {
        let mut payload = self.lock();
        payload.preferred_theme = theme_id;
        self.save_locked(&payload)
    }

    /// Replace and persist the watch list.
    pub fn set_watch_expressions(&self, expressions: Vec<String>) -> Result<(), PreferencesError> {
        let mut payload = self.lock();
        if payload.watch_expressions == expressions {
            return Ok(());
        }
        payload.watch_expressions = expressions;
        self.save_locked(&payload)
    }

    fn lock(&self) -> MutexGuard<'_, PreferencesPayload> {
        self.payload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if !self.persist_to_disk {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_preferences_path() -> PathBuf {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("watchpad")
        .join(PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = UserPreferences::at_path(dir.path().join("nope.json")).unwrap();
        assert_eq!(prefs.focus_delay(), Duration::from_millis(DEFAULT_FOCUS_DELAY_MS));
        assert!(prefs.watch_expressions().is_empty());
        assert!(prefs.preferred_theme().is_none());
    }

    #[test]
    fn watch_list_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE_NAME);
        let prefs = UserPreferences::at_path(&path).unwrap();
        prefs
            .set_watch_expressions(vec!["x + 1".into(), "y * 2".into()])
            .unwrap();
        prefs.set_preferred_theme(Some("nord".into())).unwrap();

        let reloaded = UserPreferences::at_path(&path).unwrap();
        assert_eq!(reloaded.watch_expressions(), vec!["x + 1".to_string(), "y * 2".to_string()]);
        assert_eq!(reloaded.preferred_theme().as_deref(), Some("nord"));
    }

    #[test]
    fn partial_payload_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        fs::write(&path, r#"{ "watch_expressions": ["a"] }"#).unwrap();
        let prefs = UserPreferences::at_path(&path).unwrap();
        assert_eq!(prefs.watch_expressions(), vec!["a".to_string()]);
        assert_eq!(prefs.focus_delay(), Duration::from_millis(DEFAULT_FOCUS_DELAY_MS));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        let prefs = UserPreferences::at_path(&path).unwrap();
        assert_eq!(prefs.focus_delay(), Duration::from_millis(DEFAULT_FOCUS_DELAY_MS));
    }

    #[test]
    fn ephemeral_store_never_writes() {
        let prefs = UserPreferences::ephemeral();
        prefs.set_watch_expressions(vec!["z".into()]).unwrap();
        assert_eq!(prefs.watch_expressions(), vec!["z".to_string()]);
        assert!(!prefs.persists_to_disk());
        assert_eq!(prefs.path(), Path::new(""));
    }

    #[test]
    fn env_override_selects_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("custom.json");
        let target_str = target.to_string_lossy().to_string();
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(target_str.as_str()), || {
            assert_eq!(default_preferences_path(), target);
        });
    }
}
