//! Capability traits at the transport seam
//!
//! The session layer talks to the remote service exclusively through
//! `RealtimeTransport`, so no caller ever needs to reach into adapter
//! internals for protocol-specific operations. `send_event` is the raw
//! escape hatch: disabling voice-activity detection requires an explicit
//! `turn_detection: null`, which the typed configuration surface cannot
//! express.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::credentials::EphemeralCredential;
use crate::error::Result;
use crate::events::{ClientEvent, SessionUpdate, TransportEvent};
use crate::usage::Usage;

/// Bidirectional realtime transport to the vendor service
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open the connection using a short-lived credential.
    ///
    /// Failure is terminal for this session instance; callers must not retry.
    async fn connect(&self, credential: &EphemeralCredential) -> Result<()>;

    /// Enable or disable outbound audio capture without tearing down the
    /// connection.
    fn mute(&self, muted: bool);

    /// Current mute state of the outbound audio gate
    fn is_muted(&self) -> bool;

    /// Cancel in-flight assistant speech output (barge-in).
    async fn interrupt(&self) -> Result<()>;

    /// Send a raw protocol event.
    async fn send_event(&self, event: ClientEvent) -> Result<()>;

    /// Apply a new audio-input configuration to the live connection.
    async fn update_session(&self, update: SessionUpdate) -> Result<()>;

    /// Send an out-of-band text message and request a response for it.
    async fn send_message(&self, text: &str) -> Result<()>;

    /// Complete a remote tool invocation and request the follow-up response.
    async fn send_tool_result(&self, call_id: &str, output: &str) -> Result<()>;

    /// Release the connection. Idempotent; always invoked on teardown.
    fn close(&self);

    /// Subscribe to the inbound event stream. Events are delivered in the
    /// order the transport emits them.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Cumulative usage counters as last reported by the remote service.
    fn usage(&self) -> Usage;
}

/// One-shot exchange of an authenticated backend call for an ephemeral
/// transport credential
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn fetch(&self) -> Result<EphemeralCredential>;
}
