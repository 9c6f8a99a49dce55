//! Scripted transport for tests
//!
//! Records every operation the session performs and lets a test inject
//! inbound events, so the full press/commit/response choreography can be
//! exercised without a network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use roots_core::{
    ClientEvent, CredentialProvider, EphemeralCredential, Error, RealtimeTransport, Result,
    SessionUpdate, TransportEvent, Usage,
};

/// One recorded transport operation
#[derive(Debug, Clone, PartialEq)]
pub enum MockOp {
    Connect,
    Mute(bool),
    Interrupt,
    Event(ClientEvent),
    UpdateSession(SessionUpdate),
    Message(String),
    ToolResult { call_id: String, output: String },
    Close,
}

struct MockInner {
    events: broadcast::Sender<TransportEvent>,
    ops: Mutex<Vec<MockOp>>,
    muted: AtomicBool,
    usage: RwLock<Usage>,
    connect_failure: Mutex<Option<String>>,
    send_failure: AtomicBool,
    closed: AtomicBool,
}

/// Recording transport double
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(MockInner {
                events,
                ops: Mutex::new(Vec::new()),
                muted: AtomicBool::new(false),
                usage: RwLock::new(Usage::default()),
                connect_failure: Mutex::new(None),
                send_failure: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Make the next `connect` fail with this message.
    pub fn fail_connect(&self, message: impl Into<String>) {
        *self.inner.connect_failure.lock() = Some(message.into());
    }

    /// Make every send fail (e.g. to exercise config-update error handling).
    pub fn fail_sends(&self, fail: bool) {
        self.inner.send_failure.store(fail, Ordering::SeqCst);
    }

    /// Inject an inbound event as if the remote service emitted it.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Set the cumulative usage the transport reports.
    pub fn set_usage(&self, usage: Usage) {
        *self.inner.usage.write() = usage;
    }

    pub fn ops(&self) -> Vec<MockOp> {
        self.inner.ops.lock().clone()
    }

    /// Only the raw events sent through the escape hatch.
    pub fn sent_events(&self) -> Vec<ClientEvent> {
        self.inner
            .ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                MockOp::Event(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_event(&self, wanted: &ClientEvent) -> usize {
        self.sent_events().iter().filter(|e| *e == wanted).count()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn record(&self, op: MockOp) {
        self.inner.ops.lock().push(op);
    }

    fn check_send(&self) -> Result<()> {
        if self.inner.send_failure.load(Ordering::SeqCst) {
            return Err(Error::Transport("scripted send failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn connect(&self, _credential: &EphemeralCredential) -> Result<()> {
        self.record(MockOp::Connect);
        if let Some(message) = self.inner.connect_failure.lock().take() {
            return Err(Error::Connection(message));
        }
        Ok(())
    }

    fn mute(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::SeqCst);
        self.record(MockOp::Mute(muted));
    }

    fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::SeqCst)
    }

    async fn interrupt(&self) -> Result<()> {
        self.record(MockOp::Interrupt);
        Ok(())
    }

    async fn send_event(&self, event: ClientEvent) -> Result<()> {
        self.check_send()?;
        self.record(MockOp::Event(event));
        Ok(())
    }

    async fn update_session(&self, update: SessionUpdate) -> Result<()> {
        self.check_send()?;
        self.record(MockOp::UpdateSession(update));
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        self.check_send()?;
        self.record(MockOp::Message(text.to_string()));
        Ok(())
    }

    async fn send_tool_result(&self, call_id: &str, output: &str) -> Result<()> {
        self.check_send()?;
        self.record(MockOp::ToolResult {
            call_id: call_id.to_string(),
            output: output.to_string(),
        });
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.record(MockOp::Close);
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    fn usage(&self) -> Usage {
        *self.inner.usage.read()
    }
}

/// Credential provider double
pub struct MockCredentialProvider {
    result: Mutex<Option<Result<EphemeralCredential>>>,
}

impl MockCredentialProvider {
    /// Always succeeds with a fixed token.
    pub fn ok() -> Self {
        Self {
            result: Mutex::new(Some(Ok(EphemeralCredential::new("ek_mock", 4_102_444_800)))),
        }
    }

    /// Always fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Mutex::new(Some(Err(Error::Credential(message.into())))),
        }
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn fetch(&self) -> Result<EphemeralCredential> {
        match self.result.lock().take() {
            Some(result) => result,
            // Re-fetch after the scripted result was consumed: keep working.
            None => Ok(EphemeralCredential::new("ek_mock", 4_102_444_800)),
        }
    }
}
