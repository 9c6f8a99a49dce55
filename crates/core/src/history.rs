//! Conversation history items
//!
//! The transport reports the transcript as a full ordered replace; items are
//! never patched locally.

use serde::{Deserialize, Serialize};

/// Role of a conversation item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        }
    }

    /// Loose parse from wire role strings; anything unknown is treated as
    /// system so it still renders.
    pub fn from_wire(role: &str) -> Self {
        match role {
            "user" => TurnRole::User,
            "assistant" => TurnRole::Assistant,
            _ => TurnRole::System,
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Completion state of a history item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    InProgress,
    Completed,
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Item id assigned by the remote service
    pub id: String,
    pub role: TurnRole,
    /// Transcript text; empty until transcription completes
    pub text: String,
    pub status: ItemStatus,
}

impl HistoryItem {
    pub fn new(id: impl Into<String>, role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            text: text.into(),
            status: ItemStatus::InProgress,
        }
    }

    pub fn completed(mut self) -> Self {
        self.status = ItemStatus::Completed;
        self
    }
}
