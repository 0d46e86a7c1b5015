//! Export and import of the full application state.
//!
//! The bundle carries every storage key as raw JSON values rather than typed
//! records, so a bundle written by a newer version with extra fields still
//! imports cleanly. Import validates only the shape of each section and
//! skips sections that are absent or malformed.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    NoteStore, Result, StorageBackend, ALL_KEYS, BACKGROUNDS_KEY, NOTES_KEY, SETTINGS_KEY,
    THEME_KEY,
};

/// Bundle format version written by this build.
pub const BUNDLE_VERSION: &str = "1.0.0";

/// A complete snapshot of the application's stored state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backgrounds: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub version: String,
}

/// Which sections an import actually applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub settings: bool,
    pub notes: bool,
    pub backgrounds: bool,
    pub theme: bool,
}

impl ImportSummary {
    pub fn applied_any(&self) -> bool {
        self.settings || self.notes || self.backgrounds || self.theme
    }
}

impl<B: StorageBackend> NoteStore<B> {
    /// Snapshots all stored state into a bundle. Reads degrade, so a
    /// partially unavailable store exports whatever it can.
    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle {
            settings: self.read_json(SETTINGS_KEY),
            notes: self.read_json(NOTES_KEY),
            backgrounds: self.read_json(BACKGROUNDS_KEY),
            theme: self.theme(),
            export_date: Utc::now(),
            version: BUNDLE_VERSION.to_string(),
        }
    }

    /// Applies a bundle section by section, overwriting stored state.
    ///
    /// A section with the wrong shape (settings that are not an object,
    /// notes that are not an array) is skipped with a warning rather than
    /// failing the whole import. Backend write errors still propagate.
    pub fn import_bundle(&self, bundle: &ExportBundle) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        if let Some(settings) = &bundle.settings {
            if settings.is_object() {
                self.backend.write(SETTINGS_KEY, &settings.to_string())?;
                summary.settings = true;
            } else {
                warn!("Skipping settings section: not a JSON object");
            }
        }

        if let Some(notes) = &bundle.notes {
            if notes.is_array() {
                self.backend.write(NOTES_KEY, &notes.to_string())?;
                summary.notes = true;
            } else {
                warn!("Skipping notes section: not a JSON array");
            }
        }

        if let Some(backgrounds) = &bundle.backgrounds {
            if backgrounds.is_object() {
                self.backend
                    .write(BACKGROUNDS_KEY, &backgrounds.to_string())?;
                summary.backgrounds = true;
            } else {
                warn!("Skipping backgrounds section: not a JSON object");
            }
        }

        if let Some(theme) = &bundle.theme {
            self.backend.write(THEME_KEY, theme)?;
            summary.theme = true;
        }

        info!(
            "Imported bundle (version {:?}): settings={} notes={} backgrounds={} theme={}",
            bundle.version, summary.settings, summary.notes, summary.backgrounds, summary.theme
        );
        Ok(summary)
    }

    /// Removes every storage key the application owns.
    pub fn clear_all(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.backend.remove(key)?;
        }
        info!("Cleared all stored data");
        Ok(())
    }

    fn read_json(&self, key: &str) -> Option<Value> {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Corrupt JSON under {}, omitting from export: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Storage unavailable for export ({}): {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBackend, NoteDraft, UserSettings};
    use serde_json::json;

    fn populated_store() -> NoteStore<MemoryBackend> {
        let store = NoteStore::new(MemoryBackend::new());
        store
            .create(NoteDraft {
                content: "带走的笔记".to_string(),
                tags: vec!["迁移".to_string()],
                ..NoteDraft::default()
            })
            .unwrap();
        store.save_user_settings(&UserSettings::default()).unwrap();
        store.set_theme("ocean").unwrap();
        store
    }

    #[test]
    fn export_captures_all_sections() {
        let store = populated_store();
        let bundle = store.export_bundle();

        assert_eq!(bundle.version, BUNDLE_VERSION);
        assert!(bundle.settings.as_ref().unwrap().is_object());
        assert_eq!(bundle.notes.as_ref().unwrap().as_array().unwrap().len(), 1);
        assert_eq!(bundle.theme.as_deref(), Some("ocean"));
        // Backgrounds never saved, so the section is absent.
        assert!(bundle.backgrounds.is_none());
    }

    #[test]
    fn bundle_round_trips_into_a_fresh_store() {
        let source = populated_store();
        let bundle = source.export_bundle();

        let json = serde_json::to_string(&bundle).unwrap();
        assert!(json.contains("\"exportDate\""));
        let parsed: ExportBundle = serde_json::from_str(&json).unwrap();

        let target = NoteStore::new(MemoryBackend::new());
        let summary = target.import_bundle(&parsed).unwrap();

        assert!(summary.settings && summary.notes && summary.theme);
        assert!(!summary.backgrounds);
        assert_eq!(target.list(), source.list());
        assert_eq!(target.theme().as_deref(), Some("ocean"));
    }

    #[test]
    fn malformed_sections_are_skipped_not_fatal() {
        let store = NoteStore::new(MemoryBackend::new());
        let bundle = ExportBundle {
            settings: Some(json!("not an object")),
            notes: Some(json!({"not": "an array"})),
            backgrounds: Some(json!(42)),
            theme: Some("dusk".to_string()),
            export_date: Utc::now(),
            version: "1.0.0".to_string(),
        };

        let summary = store.import_bundle(&bundle).unwrap();
        assert!(!summary.settings);
        assert!(!summary.notes);
        assert!(!summary.backgrounds);
        assert!(summary.theme);
        assert!(store.list().is_empty());
    }

    #[test]
    fn empty_bundle_applies_nothing() {
        let store = NoteStore::new(MemoryBackend::new());
        let bundle: ExportBundle = serde_json::from_str("{}").unwrap();

        let summary = store.import_bundle(&bundle).unwrap();
        assert!(!summary.applied_any());
    }

    #[test]
    fn import_overwrites_existing_state() {
        let store = populated_store();
        let bundle = ExportBundle {
            settings: None,
            notes: Some(json!([])),
            backgrounds: None,
            theme: None,
            export_date: Utc::now(),
            version: BUNDLE_VERSION.to_string(),
        };

        store.import_bundle(&bundle).unwrap();
        assert!(store.list().is_empty());
        // Untouched sections survive.
        assert_eq!(store.theme().as_deref(), Some("ocean"));
    }

    #[test]
    fn clear_all_removes_every_key() {
        let store = populated_store();
        store.clear_all().unwrap();

        assert!(store.list().is_empty());
        assert_eq!(store.theme(), None);
        assert_eq!(store.user_settings(), UserSettings::default());
        let bundle = store.export_bundle();
        assert!(bundle.notes.is_none() && bundle.settings.is_none());
    }
}
