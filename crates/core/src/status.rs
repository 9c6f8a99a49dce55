//! Turn and connection status enums

use serde::{Deserialize, Serialize};

/// Turn-taking status of the voice session
///
/// Exactly one value is active at a time. Transitions are driven only by the
/// session state machine, never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Nobody is talking; waiting for the user or the assistant
    #[default]
    Idle,
    /// The microphone is hot and user audio is flowing to the input buffer
    Listening,
    /// An utterance was committed; a response is being generated
    Thinking,
    /// Assistant audio output is playing
    Speaking,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Idle => "idle",
            TurnStatus::Listening => "listening",
            TurnStatus::Thinking => "thinking",
            TurnStatus::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection status of the underlying transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Connect is in flight (credential fetch or transport handshake)
    #[default]
    Connecting,
    /// The transport is live
    Connected,
    /// Connect failed; terminal for this session instance
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
