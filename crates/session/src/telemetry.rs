//! Event and usage telemetry
//!
//! An append-only ring buffer of timestamped, source-tagged events. Eviction
//! is FIFO: entries are never re-touched, so the oldest is always the first
//! to go.

use serde::Serialize;
use std::collections::VecDeque;

/// Maximum entries retained before the oldest are evicted
pub const EVENT_LOG_CAPACITY: usize = 200;

/// Who originated an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// User- or library-originated
    Client,
    /// Remote-originated
    Server,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Client => "client",
            EventSource::Server => "server",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One telemetry entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogEntry {
    /// Wall-clock local time, HH:MM:SS, stamped at insertion
    pub time: String,
    pub source: EventSource,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Capped, append-only event log
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if the log is full.
    pub fn push(&mut self, source: EventSource, event: impl Into<String>, detail: Option<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(EventLogEntry {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            source,
            event: event.into(),
            detail,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries most-recent-first, the order the UI displays them in.
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    /// Plain-text export for copy-to-clipboard diagnostics.
    pub fn export(&self) -> String {
        self.entries
            .iter()
            .rev()
            .map(|e| match &e.detail {
                Some(detail) => format!("{} [{}] {} {}", e.time, e.source, e.event, detail),
                None => format!("{} [{}] {}", e.time, e.source, e.event),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
