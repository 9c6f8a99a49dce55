//! Voice-session configuration
//!
//! An immutable value describing how audio input is detected and processed.
//! Two copies exist per screen: the persisted user default ("saved") and the
//! in-memory draft the settings UI edits. Copies are passed by value so the
//! tiers never alias.

use serde::{Deserialize, Serialize};

use roots_core::events::{
    Eagerness, NoiseReduction, SessionUpdate, TranscriptionConfig, TurnDetection,
};

use crate::error::ConfigError;

/// Which detector closes the user's turn in automatic mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetectionKind {
    #[default]
    ServerVad,
    SemanticVad,
}

impl TurnDetectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnDetectionKind::ServerVad => "server_vad",
            TurnDetectionKind::SemanticVad => "semantic_vad",
        }
    }
}

/// Input noise-reduction preference, including "off"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReductionKind {
    #[default]
    NearField,
    FarField,
    Off,
}

impl NoiseReductionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseReductionKind::NearField => "near_field",
            NoiseReductionKind::FarField => "far_field",
            NoiseReductionKind::Off => "off",
        }
    }

    /// The wire form; `Off` maps to an absent field.
    fn wire(&self) -> Option<NoiseReduction> {
        match self {
            NoiseReductionKind::NearField => Some(NoiseReduction::NearField),
            NoiseReductionKind::FarField => Some(NoiseReduction::FarField),
            NoiseReductionKind::Off => None,
        }
    }
}

/// Audio and turn-detection configuration for one voice session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSessionConfig {
    /// Manual push-to-talk mode: the client marks utterance boundaries and
    /// the remote detector is disabled
    pub press_to_send: bool,
    pub turn_detection: TurnDetectionKind,
    /// Semantic-VAD eagerness (ignored for server VAD)
    pub eagerness: Eagerness,
    /// Server-VAD silence before the turn closes
    pub silence_duration_ms: u32,
    /// Audio retained before detected speech onset
    pub prefix_padding_ms: u32,
    /// Server-VAD activation threshold, 0.0–1.0
    pub threshold: f32,
    pub noise_reduction: NoiseReductionKind,
    /// Tail-buffer delay between press release and the manual commit, so the
    /// last audio frames reach the server before the buffer closes
    pub commit_delay_ms: u64,
    /// Assistant voice identifier
    pub voice: String,
}

impl Default for VoiceSessionConfig {
    fn default() -> Self {
        Self {
            press_to_send: false,
            turn_detection: TurnDetectionKind::ServerVad,
            eagerness: Eagerness::Auto,
            silence_duration_ms: 500,
            prefix_padding_ms: 300,
            threshold: 0.5,
            noise_reduction: NoiseReductionKind::NearField,
            commit_delay_ms: 200,
            voice: "coral".to_string(),
        }
    }
}

impl VoiceSessionConfig {
    /// Factory defaults (the compiled-in baseline)
    pub fn factory() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::invalid(
                "threshold",
                format!("must be between 0.0 and 1.0, got {}", self.threshold),
            ));
        }
        if self.commit_delay_ms > 5_000 {
            return Err(ConfigError::invalid(
                "commit_delay_ms",
                format!("implausible tail delay: {}ms", self.commit_delay_ms),
            ));
        }
        if self.voice.is_empty() {
            return Err(ConfigError::invalid("voice", "voice must not be empty"));
        }
        Ok(())
    }

    /// The detector this config asks for in automatic mode
    fn wire_turn_detection(&self) -> TurnDetection {
        match self.turn_detection {
            TurnDetectionKind::ServerVad => TurnDetection::ServerVad {
                threshold: self.threshold,
                prefix_padding_ms: self.prefix_padding_ms,
                silence_duration_ms: self.silence_duration_ms,
            },
            TurnDetectionKind::SemanticVad => TurnDetection::SemanticVad {
                eagerness: self.eagerness,
            },
        }
    }

    /// Build the `session.update` payload for a live config change.
    ///
    /// In manual mode `turn_detection` stays an explicit `null` so a config
    /// push can never re-enable the remote detector mid-session; only noise
    /// reduction changes take effect there.
    pub fn session_update(&self, manual: bool) -> SessionUpdate {
        SessionUpdate {
            input_audio_transcription: Some(TranscriptionConfig::default()),
            turn_detection: if manual {
                None
            } else {
                Some(self.wire_turn_detection())
            },
            input_audio_noise_reduction: self.noise_reduction.wire(),
            ..SessionUpdate::new()
        }
    }

    /// The initial `session.update` sent right after connect, carrying the
    /// agent instructions and assistant voice alongside the audio config.
    pub fn connect_update(&self, manual: bool, instructions: impl Into<String>) -> SessionUpdate {
        SessionUpdate {
            instructions: Some(instructions.into()),
            voice: Some(self.voice.clone()),
            ..self.session_update(manual)
        }
    }
}
