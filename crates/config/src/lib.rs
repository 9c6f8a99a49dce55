//! Configuration for the Roots voice tutor
//!
//! Three concerns live here:
//! - `VoiceSessionConfig`: the audio/VAD configuration applied to a realtime
//!   session, and its translation into wire `session.update` payloads
//! - `VoiceSettings`: the factory → saved → draft tiering over a simple
//!   key-value `SettingsStore`
//! - `Settings`: app-level settings loaded from YAML files and environment
//!   variables

pub mod app;
pub mod error;
pub mod settings;
pub mod store;
pub mod voice;

pub use app::{load_settings, BackendConfig, ObservabilityConfig, Settings, StorageConfig};
pub use error::ConfigError;
pub use settings::{LanguagePreference, VoiceSettings, LANGUAGE_KEY, VOICE_SETTINGS_KEY};
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use voice::{NoiseReductionKind, TurnDetectionKind, VoiceSessionConfig};
