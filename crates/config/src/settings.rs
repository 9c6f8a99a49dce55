//! Three-tier voice settings and the persisted language preference
//!
//! Factory defaults (constant) → saved (persisted key-value entry, falls back
//! to factory if absent or unparsable) → draft (in-memory, freely edited by
//! the settings and debug screens). "Unsaved changes" and "at factory
//! defaults" are derived by field-wise comparison; there is no dirty bit.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::store::SettingsStore;
use crate::voice::VoiceSessionConfig;

/// Key under which the saved voice config lives
pub const VOICE_SETTINGS_KEY: &str = "roots-voice-settings";

/// Key under which the selected UI language code lives
pub const LANGUAGE_KEY: &str = "roots-language";

/// Saved + draft configuration over a settings store
pub struct VoiceSettings {
    store: Arc<dyn SettingsStore>,
    saved: VoiceSessionConfig,
    draft: VoiceSessionConfig,
}

impl VoiceSettings {
    /// Load the saved config from the store, falling back to factory
    /// defaults when the entry is absent or does not parse. The draft starts
    /// as a copy of saved.
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let saved = match store.get(VOICE_SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Stored voice settings unreadable, using defaults: {}", e);
                VoiceSessionConfig::factory()
            }),
            Ok(None) => VoiceSessionConfig::factory(),
            Err(e) => {
                tracing::warn!("Settings store unavailable, using defaults: {}", e);
                VoiceSessionConfig::factory()
            }
        };
        let draft = saved.clone();
        Self {
            store,
            saved,
            draft,
        }
    }

    pub fn saved(&self) -> &VoiceSessionConfig {
        &self.saved
    }

    pub fn draft(&self) -> &VoiceSessionConfig {
        &self.draft
    }

    /// Replace the draft wholesale (settings forms edit a copy).
    pub fn set_draft(&mut self, config: VoiceSessionConfig) {
        self.draft = config;
    }

    /// Discard unsaved edits.
    pub fn reset_draft_to_saved(&mut self) {
        self.draft = self.saved.clone();
    }

    /// Persist the draft, making it the new saved default.
    pub fn save_draft_as_default(&mut self) -> Result<(), ConfigError> {
        let blob = serde_json::to_string(&self.draft)?;
        self.store.set(VOICE_SETTINGS_KEY, &blob)?;
        self.saved = self.draft.clone();
        Ok(())
    }

    /// Clear the persisted override and restore factory defaults to both
    /// tiers.
    pub fn reset_to_factory(&mut self) -> Result<(), ConfigError> {
        self.store.remove(VOICE_SETTINGS_KEY)?;
        self.saved = VoiceSessionConfig::factory();
        self.draft = VoiceSessionConfig::factory();
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.draft != self.saved
    }

    pub fn is_factory_defaults(&self) -> bool {
        self.draft == VoiceSessionConfig::factory()
    }
}

/// Persisted UI-language selection
pub struct LanguagePreference {
    store: Arc<dyn SettingsStore>,
}

impl LanguagePreference {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// The saved language code, if any. Store failures read as "none".
    pub fn language_code(&self) -> Option<String> {
        self.store.get(LANGUAGE_KEY).ok().flatten()
    }

    pub fn set_language_code(&self, code: &str) -> Result<(), ConfigError> {
        self.store.set(LANGUAGE_KEY, code)
    }

    pub fn clear(&self) -> Result<(), ConfigError> {
        self.store.remove(LANGUAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySettingsStore;
    use crate::voice::NoiseReductionKind;

    fn store() -> Arc<dyn SettingsStore> {
        Arc::new(MemorySettingsStore::new())
    }

    #[test]
    fn test_load_without_saved_entry_is_factory() {
        let settings = VoiceSettings::load(store());
        assert_eq!(settings.saved(), &VoiceSessionConfig::factory());
        assert!(!settings.has_unsaved_changes());
        assert!(settings.is_factory_defaults());
    }

    #[test]
    fn test_save_then_reload_round_trips_field_by_field() {
        let store = store();

        let mut settings = VoiceSettings::load(store.clone());
        let mut draft = settings.draft().clone();
        draft.press_to_send = true;
        draft.commit_delay_ms = 400;
        draft.noise_reduction = NoiseReductionKind::FarField;
        settings.set_draft(draft.clone());
        assert!(settings.has_unsaved_changes());
        settings.save_draft_as_default().unwrap();
        assert!(!settings.has_unsaved_changes());

        // Fresh manager over the same store simulates a reload
        let reloaded = VoiceSettings::load(store);
        assert_eq!(reloaded.saved(), &draft);
        assert_eq!(reloaded.draft(), &draft);
    }

    #[test]
    fn test_reset_draft_discards_edits() {
        let mut settings = VoiceSettings::load(store());
        let mut draft = settings.draft().clone();
        draft.threshold = 0.9;
        settings.set_draft(draft);
        settings.reset_draft_to_saved();
        assert!(!settings.has_unsaved_changes());
    }

    #[test]
    fn test_reset_to_factory_from_any_state() {
        let store = store();
        let mut settings = VoiceSettings::load(store.clone());
        let mut draft = settings.draft().clone();
        draft.press_to_send = true;
        settings.set_draft(draft);
        settings.save_draft_as_default().unwrap();

        settings.reset_to_factory().unwrap();
        assert_eq!(settings.saved(), &VoiceSessionConfig::factory());
        assert_eq!(settings.draft(), &VoiceSessionConfig::factory());
        assert!(settings.is_factory_defaults());
        // Persisted override is gone too
        assert_eq!(store.get(VOICE_SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn test_unparsable_blob_falls_back_to_factory() {
        let store = store();
        store.set(VOICE_SETTINGS_KEY, "{{{ definitely not json").unwrap();
        let settings = VoiceSettings::load(store);
        assert_eq!(settings.saved(), &VoiceSessionConfig::factory());
    }

    #[test]
    fn test_language_preference() {
        let store = store();
        let pref = LanguagePreference::new(store);
        assert_eq!(pref.language_code(), None);
        pref.set_language_code("fr").unwrap();
        assert_eq!(pref.language_code().as_deref(), Some("fr"));
        pref.clear().unwrap();
        assert_eq!(pref.language_code(), None);
    }
}
