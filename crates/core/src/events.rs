//! Wire-level event types for the realtime transport
//!
//! Outbound events (`ClientEvent`) are serialised exactly as the vendor
//! protocol expects, with dotted `type` tags. Inbound events are decoded into
//! `TransportEvent`, a small enum covering the lifecycle events the session
//! state machine consumes; everything else arrives as `Other` so the
//! telemetry log still sees it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::HistoryItem;

/// Session-type discriminator required by the remote protocol
pub const SESSION_TYPE: &str = "realtime";

/// Transcription model applied to inbound user audio
pub const TRANSCRIPTION_MODEL: &str = "gpt-4o-mini-transcribe";

/// Outbound protocol events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update the live session configuration
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionUpdate },

    /// Close the input audio buffer, marking the utterance complete
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Discard any uncommitted input audio
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear,

    /// Append base64-encoded audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },

    /// Request a response for the committed conversation state
    #[serde(rename = "response.create")]
    ResponseCreate,

    /// Cancel the in-flight response (barge-in)
    #[serde(rename = "response.cancel")]
    ResponseCancel,

    /// Insert an out-of-band conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItemPayload },
}

/// Payload for `conversation.item.create`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItemPayload {
    Message {
        role: String,
        content: Vec<ContentPart>,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl ConversationItemPayload {
    /// A plain user-role text message
    pub fn user_text(text: impl Into<String>) -> Self {
        ConversationItemPayload::Message {
            role: "user".to_string(),
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
}

/// The `session` payload of a `session.update` event
///
/// `turn_detection` is always serialised, even when `None`: an explicit JSON
/// `null` is the only way to disable the vendor's voice-activity detection,
/// and omitting the field leaves the previous detector active.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    #[serde(rename = "type")]
    pub session_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<TranscriptionConfig>,
    pub turn_detection: Option<TurnDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_noise_reduction: Option<NoiseReduction>,
}

impl SessionUpdate {
    /// A payload that carries only the session-type tag; callers fill in the
    /// fields they intend to change.
    pub fn new() -> Self {
        Self {
            session_type: SESSION_TYPE,
            instructions: None,
            voice: None,
            input_audio_transcription: None,
            turn_detection: None,
            input_audio_noise_reduction: None,
        }
    }
}

impl Default for SessionUpdate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: TRANSCRIPTION_MODEL.to_string(),
        }
    }
}

/// Server-side voice-activity detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    ServerVad {
        threshold: f32,
        prefix_padding_ms: u32,
        silence_duration_ms: u32,
    },
    SemanticVad {
        eagerness: Eagerness,
    },
}

/// How eagerly semantic VAD closes a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Eagerness {
    Low,
    Medium,
    High,
    #[default]
    Auto,
}

impl Eagerness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eagerness::Low => "low",
            Eagerness::Medium => "medium",
            Eagerness::High => "high",
            Eagerness::Auto => "auto",
        }
    }
}

/// Input noise-reduction mode, as sent on the wire ("off" is expressed by
/// omitting the field entirely)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoiseReduction {
    NearField,
    FarField,
}

/// Inbound transport events consumed by the session
///
/// Unrecognised wire types arrive as `Other`; incremental `.delta` payloads
/// are delivered but flagged so they can be kept out of the telemetry log.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The remote detector heard speech begin (automatic mode only)
    SpeechStarted { audio_start_ms: Option<u64> },
    /// The remote detector heard speech end
    SpeechStopped { audio_end_ms: Option<u64> },
    /// A response cycle began
    ResponseCreated { response_id: Option<String> },
    /// A response cycle finished
    ResponseDone { response_id: Option<String> },
    /// Assistant audio output started playing
    OutputAudioStarted,
    /// The remote agent invoked a local tool
    ToolCallRequested {
        name: String,
        call_id: String,
        arguments: String,
    },
    /// Full ordered transcript replace
    HistoryUpdated { items: Vec<HistoryItem> },
    /// Generic protocol error
    Error { message: String },
    /// Anything else the protocol sends
    Other { event_type: String },
}

impl TransportEvent {
    /// Decode a raw wire event by its `type` field.
    ///
    /// Tool invocations surface from `response.output_item.done` events whose
    /// item is a function call; history replacement is synthesised by the
    /// transport adapter rather than decoded here.
    pub fn from_wire(value: &Value) -> TransportEvent {
        let event_type = value.get("type").and_then(|t| t.as_str()).unwrap_or("");

        match event_type {
            "input_audio_buffer.speech_started" => TransportEvent::SpeechStarted {
                audio_start_ms: value.get("audio_start_ms").and_then(|v| v.as_u64()),
            },
            "input_audio_buffer.speech_stopped" => TransportEvent::SpeechStopped {
                audio_end_ms: value.get("audio_end_ms").and_then(|v| v.as_u64()),
            },
            "response.created" => TransportEvent::ResponseCreated {
                response_id: response_id(value),
            },
            "response.done" => TransportEvent::ResponseDone {
                response_id: response_id(value),
            },
            "output_audio_buffer.started" => TransportEvent::OutputAudioStarted,
            "response.output_item.done" => match function_call(value) {
                Some(event) => event,
                None => TransportEvent::Other {
                    event_type: event_type.to_string(),
                },
            },
            "error" => TransportEvent::Error {
                message: value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            },
            other => TransportEvent::Other {
                event_type: other.to_string(),
            },
        }
    }

    /// Event name used for telemetry
    pub fn wire_name(&self) -> &str {
        match self {
            TransportEvent::SpeechStarted { .. } => "input_audio_buffer.speech_started",
            TransportEvent::SpeechStopped { .. } => "input_audio_buffer.speech_stopped",
            TransportEvent::ResponseCreated { .. } => "response.created",
            TransportEvent::ResponseDone { .. } => "response.done",
            TransportEvent::OutputAudioStarted => "output_audio_buffer.started",
            TransportEvent::ToolCallRequested { .. } => "tool_call_requested",
            TransportEvent::HistoryUpdated { .. } => "history_updated",
            TransportEvent::Error { .. } => "error",
            TransportEvent::Other { event_type } => event_type,
        }
    }

    /// Human-readable detail for the telemetry log, where one exists
    pub fn detail(&self) -> Option<String> {
        match self {
            TransportEvent::SpeechStarted {
                audio_start_ms: Some(ms),
            } => Some(format!("at {}ms", ms)),
            TransportEvent::SpeechStopped {
                audio_end_ms: Some(ms),
            } => Some(format!("at {}ms", ms)),
            TransportEvent::ResponseCreated { response_id }
            | TransportEvent::ResponseDone { response_id } => response_id.clone(),
            TransportEvent::Error { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Incremental delta payloads are excluded from the telemetry log to
    /// avoid flooding it.
    pub fn is_delta(&self) -> bool {
        matches!(self, TransportEvent::Other { event_type } if event_type.contains(".delta"))
    }
}

fn response_id(value: &Value) -> Option<String> {
    value
        .get("response")
        .and_then(|r| r.get("id"))
        .and_then(|id| id.as_str())
        .map(str::to_string)
}

fn function_call(value: &Value) -> Option<TransportEvent> {
    let item = value.get("item")?;
    if item.get("type").and_then(|t| t.as_str()) != Some("function_call") {
        return None;
    }
    Some(TransportEvent::ToolCallRequested {
        name: item.get("name")?.as_str()?.to_string(),
        call_id: item.get("call_id")?.as_str()?.to_string(),
        arguments: item
            .get("arguments")
            .and_then(|a| a.as_str())
            .unwrap_or("{}")
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_wire_tags() {
        let commit = serde_json::to_value(&ClientEvent::InputAudioBufferCommit).unwrap();
        assert_eq!(commit["type"], "input_audio_buffer.commit");

        let create = serde_json::to_value(&ClientEvent::ResponseCreate).unwrap();
        assert_eq!(create["type"], "response.create");
    }

    #[test]
    fn test_session_update_disabled_vad_serialises_null() {
        let update = SessionUpdate {
            input_audio_transcription: Some(TranscriptionConfig::default()),
            ..SessionUpdate::new()
        };
        let wire = serde_json::to_value(&ClientEvent::SessionUpdate { session: update }).unwrap();

        assert_eq!(wire["session"]["type"], "realtime");
        // Must be an explicit null, not an absent key
        assert!(wire["session"]
            .as_object()
            .unwrap()
            .contains_key("turn_detection"));
        assert!(wire["session"]["turn_detection"].is_null());
    }

    #[test]
    fn test_session_update_server_vad() {
        let update = SessionUpdate {
            turn_detection: Some(TurnDetection::ServerVad {
                threshold: 0.5,
                prefix_padding_ms: 300,
                silence_duration_ms: 500,
            }),
            ..SessionUpdate::new()
        };
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire["turn_detection"]["type"], "server_vad");
        assert_eq!(wire["turn_detection"]["silence_duration_ms"], 500);
    }

    #[test]
    fn test_noise_reduction_off_is_omitted() {
        let wire = serde_json::to_value(SessionUpdate::new()).unwrap();
        assert!(!wire
            .as_object()
            .unwrap()
            .contains_key("input_audio_noise_reduction"));
    }

    #[test]
    fn test_from_wire_speech_events() {
        let ev = TransportEvent::from_wire(&json!({
            "type": "input_audio_buffer.speech_started",
            "audio_start_ms": 1200,
        }));
        assert_eq!(
            ev,
            TransportEvent::SpeechStarted {
                audio_start_ms: Some(1200)
            }
        );
        assert_eq!(ev.detail().as_deref(), Some("at 1200ms"));
    }

    #[test]
    fn test_from_wire_response_lifecycle() {
        let ev = TransportEvent::from_wire(&json!({
            "type": "response.done",
            "response": { "id": "resp_123" },
        }));
        assert_eq!(
            ev,
            TransportEvent::ResponseDone {
                response_id: Some("resp_123".to_string())
            }
        );
    }

    #[test]
    fn test_from_wire_function_call() {
        let ev = TransportEvent::from_wire(&json!({
            "type": "response.output_item.done",
            "item": {
                "type": "function_call",
                "name": "rate_pronunciation",
                "call_id": "call_1",
                "arguments": "{\"rating\":2}",
            },
        }));
        match ev {
            TransportEvent::ToolCallRequested {
                name,
                call_id,
                arguments,
            } => {
                assert_eq!(name, "rate_pronunciation");
                assert_eq!(call_id, "call_1");
                assert_eq!(arguments, "{\"rating\":2}");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_delta_detection() {
        let ev = TransportEvent::from_wire(&json!({ "type": "response.output_audio.delta" }));
        assert!(ev.is_delta());
        let ev = TransportEvent::from_wire(&json!({ "type": "session.updated" }));
        assert!(!ev.is_delta());
    }
}
