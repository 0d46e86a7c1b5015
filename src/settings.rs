//! User-facing display settings and theme selection.
//!
//! Settings share the note blob's failure semantics: reads fall back to
//! defaults when the key is absent, the backend is down, or the stored JSON
//! is corrupt; saves propagate backend errors.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    NoteStore, Result, StorageBackend, BACKGROUNDS_KEY, SETTINGS_KEY, THEME_KEY,
};

/// Display preferences, persisted in camelCase like the note blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_weight")]
    pub font_weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_background: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_font_size() -> u32 {
    16
}

fn default_font_family() -> String {
    "inter".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            auto_save: true,
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            note_background: None,
            home_background: None,
        }
    }
}

/// Background images keyed by surface, stored as data URIs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_background: Option<String>,
}

impl<B: StorageBackend> NoteStore<B> {
    /// Loads user settings, falling back to defaults on any read problem.
    pub fn user_settings(&self) -> UserSettings {
        self.read_or_default(SETTINGS_KEY)
    }

    pub fn save_user_settings(&self, settings: &UserSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.backend.write(SETTINGS_KEY, &raw)
    }

    pub fn background_settings(&self) -> BackgroundSettings {
        self.read_or_default(BACKGROUNDS_KEY)
    }

    pub fn save_background_settings(&self, settings: &BackgroundSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.backend.write(BACKGROUNDS_KEY, &raw)
    }

    /// The selected theme id. Stored as a bare string, not JSON.
    pub fn theme(&self) -> Option<String> {
        match self.backend.read(THEME_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("Theme storage unavailable for read: {}", e);
                None
            }
        }
    }

    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.backend.write(THEME_KEY, theme)
    }

    /// Drops all settings and the theme back to defaults. Notes are left
    /// alone.
    pub fn reset_settings(&self) -> Result<()> {
        self.backend.remove(SETTINGS_KEY)?;
        self.backend.remove(BACKGROUNDS_KEY)?;
        self.backend.remove(THEME_KEY)
    }

    fn read_or_default<T: Default + for<'de> Deserialize<'de>>(&self, key: &str) -> T {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Corrupt settings under {}, using defaults: {}", key, e);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Settings storage unavailable for read ({}): {}", key, e);
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    #[test]
    fn settings_default_until_saved() {
        let store = NoteStore::new(MemoryBackend::new());

        let settings = store.user_settings();
        assert!(settings.auto_save);
        assert_eq!(settings.font_size, 16);
        assert_eq!(settings.font_family, "inter");
        assert_eq!(settings.font_weight, "normal");

        let mut changed = settings.clone();
        changed.font_size = 20;
        changed.auto_save = false;
        store.save_user_settings(&changed).unwrap();
        assert_eq!(store.user_settings(), changed);
    }

    #[test]
    fn settings_persist_in_camel_case() {
        let store = NoteStore::new(MemoryBackend::new());
        store.save_user_settings(&UserSettings::default()).unwrap();

        let raw = store.backend().read(SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"autoSave\""));
        assert!(raw.contains("\"fontSize\""));
        assert!(raw.contains("\"fontFamily\""));
    }

    #[test]
    fn partial_settings_blob_fills_in_defaults() {
        let store = NoteStore::new(MemoryBackend::new());
        store
            .backend()
            .write(SETTINGS_KEY, r#"{"fontSize": 18}"#)
            .unwrap();

        let settings = store.user_settings();
        assert_eq!(settings.font_size, 18);
        assert!(settings.auto_save);
        assert_eq!(settings.font_family, "inter");
    }

    #[test]
    fn corrupt_settings_blob_falls_back_to_defaults() {
        let store = NoteStore::new(MemoryBackend::new());
        store.backend().write(SETTINGS_KEY, "not json").unwrap();
        assert_eq!(store.user_settings(), UserSettings::default());
    }

    #[test]
    fn theme_round_trips_as_a_bare_string() {
        let store = NoteStore::new(MemoryBackend::new());
        assert_eq!(store.theme(), None);

        store.set_theme("sakura").unwrap();
        assert_eq!(store.theme().as_deref(), Some("sakura"));
        // Not wrapped in JSON quotes.
        assert_eq!(
            store.backend().read(THEME_KEY).unwrap().as_deref(),
            Some("sakura")
        );
    }

    #[test]
    fn reset_drops_settings_back_to_defaults() {
        let store = NoteStore::new(MemoryBackend::new());
        let mut settings = UserSettings::default();
        settings.font_size = 22;
        store.save_user_settings(&settings).unwrap();
        store.set_theme("forest").unwrap();

        store.reset_settings().unwrap();
        assert_eq!(store.user_settings(), UserSettings::default());
        assert_eq!(store.theme(), None);
    }

    #[test]
    fn background_settings_round_trip() {
        let store = NoteStore::new(MemoryBackend::new());
        assert_eq!(store.background_settings(), BackgroundSettings::default());

        let backgrounds = BackgroundSettings {
            note_background: Some("data:image/png;base64,AA==".to_string()),
            home_background: None,
        };
        store.save_background_settings(&backgrounds).unwrap();
        assert_eq!(store.background_settings(), backgrounds);
    }
}
