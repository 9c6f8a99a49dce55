//! Core types and traits for the Roots voice tutor client
//!
//! This crate provides the shared vocabulary used across all other crates:
//! - Turn and connection status enums
//! - Wire-level event types for the realtime transport
//! - Conversation history items and usage counters
//! - The `RealtimeTransport` and `CredentialProvider` capability traits
//! - Error types

pub mod credentials;
pub mod error;
pub mod events;
pub mod history;
pub mod status;
pub mod traits;
pub mod usage;

pub use credentials::EphemeralCredential;
pub use error::{Error, Result};
pub use events::{
    ClientEvent, ContentPart, ConversationItemPayload, Eagerness, NoiseReduction, SessionUpdate,
    TranscriptionConfig, TransportEvent, TurnDetection, SESSION_TYPE, TRANSCRIPTION_MODEL,
};
pub use history::{HistoryItem, ItemStatus, TurnRole};
pub use status::{ConnectionStatus, TurnStatus};
pub use traits::{CredentialProvider, RealtimeTransport};
pub use usage::Usage;
