//! The voice session driver
//!
//! Owns the transport handle for exactly one screen visit: it runs the
//! connect sequence, pumps transport events through the turn machine,
//! interprets the machine's actions, schedules the cancellable tail-commit
//! timer, dispatches remote tool invocations, and feeds the telemetry log
//! and usage mirror. Destroyed (transport closed) when the owning screen
//! goes away; never shared across screens.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, watch};

use roots_config::VoiceSessionConfig;
use roots_core::{
    ClientEvent, ConnectionStatus, CredentialProvider, Error, HistoryItem, RealtimeTransport,
    Result, TransportEvent, TurnStatus, Usage,
};
use roots_tools::{ToolExecutor, ToolRegistry};

use crate::machine::{Action, MachineInput, SessionMode, TurnMachine};
use crate::telemetry::{EventLog, EventLogEntry, EventSource};

/// Longest tool-result echo kept in a telemetry detail
const TOOL_RESULT_LOG_CHARS: usize = 80;

/// Everything a session needs at creation time
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub voice_config: VoiceSessionConfig,
    /// Instructions the remote agent is primed with at connect
    pub instructions: String,
    /// Out-of-band message sent once the connection is up
    pub initial_message: Option<String>,
}

struct SessionInner {
    transport: Arc<dyn RealtimeTransport>,
    credentials: Arc<dyn CredentialProvider>,
    tools: Arc<ToolRegistry>,
    mode: SessionMode,
    instructions: String,
    initial_message: Option<String>,

    machine: Mutex<TurnMachine>,
    log: Mutex<EventLog>,
    usage: RwLock<Usage>,
    history: RwLock<Vec<HistoryItem>>,
    voice_config: RwLock<VoiceSessionConfig>,

    status_tx: watch::Sender<TurnStatus>,
    connection_tx: watch::Sender<ConnectionStatus>,
    feedback_tx: watch::Sender<Option<String>>,
    pressed_tx: watch::Sender<bool>,

    closed: AtomicBool,
}

/// One voice session, exclusively owned by the screen that created it
pub struct VoiceSession {
    inner: Arc<SessionInner>,
}

impl VoiceSession {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        credentials: Arc<dyn CredentialProvider>,
        tools: Arc<ToolRegistry>,
        options: SessionOptions,
    ) -> Self {
        let mode = if options.voice_config.press_to_send {
            SessionMode::Manual
        } else {
            SessionMode::Automatic
        };

        let (status_tx, _) = watch::channel(TurnStatus::Idle);
        let (connection_tx, _) = watch::channel(ConnectionStatus::Connecting);
        let (feedback_tx, _) = watch::channel(None);
        let (pressed_tx, _) = watch::channel(false);

        let machine = TurnMachine::new(mode, options.voice_config.commit_delay_ms);
        let mut log = EventLog::new();
        log.push(
            EventSource::Client,
            "session_created",
            Some(format!("voice: {}", options.voice_config.voice)),
        );

        Self {
            inner: Arc::new(SessionInner {
                transport,
                credentials,
                tools,
                mode,
                instructions: options.instructions,
                initial_message: options.initial_message,
                machine: Mutex::new(machine),
                log: Mutex::new(log),
                usage: RwLock::new(Usage::default()),
                history: RwLock::new(Vec::new()),
                voice_config: RwLock::new(options.voice_config),
                status_tx,
                connection_tx,
                feedback_tx,
                pressed_tx,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Fetch a credential and open the transport. A failure anywhere is
    /// terminal: status moves to `error`, the cause is logged, and nothing
    /// is retried.
    pub async fn connect(&self) -> Result<()> {
        let inner = &self.inner;

        // Subscribe before the handshake so nothing emitted while connecting
        // is lost.
        let events = inner.transport.subscribe();

        let credential = match inner.credentials.fetch().await {
            Ok(credential) => credential,
            Err(e) => return Err(SessionInner::fail_connect(inner, e)),
        };

        if let Err(e) = inner.transport.connect(&credential).await {
            return Err(SessionInner::fail_connect(inner, e));
        }

        SessionInner::set_connection(inner, ConnectionStatus::Connected);
        inner.log(EventSource::Client, "connected", None);

        let manual = inner.mode == SessionMode::Manual;
        if manual {
            // Entering the screen must not start listening.
            inner.transport.mute(true);
            inner.log(EventSource::Client, "muted_on_connect", None);
        }

        let update = inner
            .voice_config
            .read()
            .connect_update(manual, &inner.instructions);
        match inner.transport.update_session(update).await {
            Ok(()) => {
                if manual {
                    inner.log(
                        EventSource::Client,
                        "vad_disabled",
                        Some("turn_detection: null".to_string()),
                    );
                }
            }
            Err(e) => {
                inner.log(
                    EventSource::Client,
                    "config_update_error",
                    Some(e.to_string()),
                );
            }
        }

        if let Some(message) = &inner.initial_message {
            match inner.transport.send_message(message).await {
                Ok(()) => inner.log(EventSource::Client, "initial_message_sent", None),
                Err(e) => inner.log(EventSource::Client, "error", Some(e.to_string())),
            }
        }

        SessionInner::spawn_event_pump(inner, events);

        Ok(())
    }

    /// The user pressed the speak control.
    pub async fn press_start(&self) {
        SessionInner::dispatch(&self.inner, MachineInput::PressStart).await;
        let listening = self.inner.machine.lock().status() == TurnStatus::Listening;
        if listening {
            let _ = self.inner.pressed_tx.send_replace(true);
        }
    }

    /// The user released the speak control (pointer-up or pointer-leave;
    /// duplicates for one gesture are absorbed).
    pub async fn press_end(&self) {
        let _ = self.inner.pressed_tx.send_replace(false);
        SessionInner::dispatch(&self.inner, MachineInput::PressEnd).await;
    }

    /// Manual user mute override. Only meaningful in automatic mode; in
    /// manual mode mute is derived from the turn status.
    pub async fn toggle_mute(&self) -> bool {
        if self.inner.mode == SessionMode::Manual {
            tracing::debug!("Mute toggle ignored in manual mode");
            return self.is_muted();
        }
        let muted = !self.inner.transport.is_muted();
        self.inner.transport.mute(muted);
        muted
    }

    /// Push a new audio configuration into the live session. Failures are
    /// logged and swallowed; the session keeps running on the old config.
    pub async fn update_voice_config(&self, config: VoiceSessionConfig) {
        let inner = &self.inner;

        if let Err(e) = config.validate() {
            inner.log(
                EventSource::Client,
                "config_update_error",
                Some(e.to_string()),
            );
            return;
        }

        let manual = inner.mode == SessionMode::Manual;
        let update = config.session_update(manual);
        let noise = config.noise_reduction.as_str();

        inner.machine.lock().set_commit_delay(config.commit_delay_ms);
        *inner.voice_config.write() = config;

        match inner.transport.update_session(update).await {
            Ok(()) => inner.log(
                EventSource::Client,
                "config_updated",
                Some(format!("noise_reduction: {}", noise)),
            ),
            Err(e) => inner.log(
                EventSource::Client,
                "config_update_error",
                Some(e.to_string()),
            ),
        }
    }

    /// Tear the session down. Idempotent; any pending tail-commit becomes a
    /// no-op.
    pub fn close(&self) {
        SessionInner::close(&self.inner);
    }

    pub fn mode(&self) -> SessionMode {
        self.inner.mode
    }

    pub fn status(&self) -> TurnStatus {
        *self.inner.status_tx.borrow()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.inner.connection_tx.borrow()
    }

    /// Transient user-visible recovery message, if any
    pub fn feedback(&self) -> Option<String> {
        self.inner.feedback_tx.borrow().clone()
    }

    pub fn is_pressed(&self) -> bool {
        *self.inner.pressed_tx.borrow()
    }

    pub fn is_muted(&self) -> bool {
        match self.inner.mode {
            SessionMode::Manual => self.inner.machine.lock().is_muted(),
            SessionMode::Automatic => self.inner.transport.is_muted(),
        }
    }

    /// Whether the press control should be disabled
    pub fn speak_disabled(&self) -> bool {
        self.inner.machine.lock().speak_disabled()
    }

    pub fn usage(&self) -> Usage {
        *self.inner.usage.read()
    }

    pub fn history(&self) -> Vec<HistoryItem> {
        self.inner.history.read().clone()
    }

    pub fn event_log(&self) -> Vec<EventLogEntry> {
        self.inner.log.lock().entries()
    }

    /// Plain-text log export for diagnostics
    pub fn export_event_log(&self) -> String {
        self.inner.log.lock().export()
    }

    pub fn watch_status(&self) -> watch::Receiver<TurnStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.connection_tx.subscribe()
    }

    pub fn watch_feedback(&self) -> watch::Receiver<Option<String>> {
        self.inner.feedback_tx.subscribe()
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        // Abnormal unmount still releases the transport.
        SessionInner::close(&self.inner);
    }
}

impl SessionInner {
    fn log(&self, source: EventSource, event: impl Into<String>, detail: Option<String>) {
        self.log.lock().push(source, event, detail);
    }

    fn fail_connect(inner: &Arc<SessionInner>, error: Error) -> Error {
        tracing::error!("Failed to connect session: {}", error);
        SessionInner::set_connection(inner, ConnectionStatus::Error);
        inner.log(
            EventSource::Client,
            "connection_error",
            Some(error.to_string()),
        );
        error
    }

    fn set_connection(inner: &Arc<SessionInner>, connection: ConnectionStatus) {
        inner.machine.lock().set_connection(connection);
        let _ = inner.connection_tx.send_replace(connection);
    }

    fn close(inner: &Arc<SessionInner>) {
        if inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.machine.lock().cancel_pending_commit();
        inner.transport.close();
        inner.log(EventSource::Client, "session_closed", None);
    }

    /// Run one input through the machine and perform its actions.
    ///
    /// Boxed because the tail-commit timer re-enters dispatch when it fires.
    fn dispatch<'a>(
        inner: &'a Arc<SessionInner>,
        input: MachineInput,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let (actions, status) = {
                let mut machine = inner.machine.lock();
                let actions = machine.handle(input);
                (actions, machine.status())
            };

            for action in actions {
                SessionInner::perform(inner, action).await;
            }

            // Only wake watchers on a real transition.
            inner.status_tx.send_if_modified(|current| {
                if *current != status {
                    *current = status;
                    true
                } else {
                    false
                }
            });
        })
    }

    async fn perform(inner: &Arc<SessionInner>, action: Action) {
        match action {
            Action::ClearFeedback => {
                inner.feedback_tx.send_if_modified(|current| {
                    if current.is_some() {
                        *current = None;
                        true
                    } else {
                        false
                    }
                });
            }
            Action::SetFeedback(message) => {
                let _ = inner.feedback_tx.send_replace(Some(message));
            }
            Action::Mute(muted) => inner.transport.mute(muted),
            Action::Interrupt => {
                if let Err(e) = inner.transport.interrupt().await {
                    inner.log(EventSource::Client, "error", Some(e.to_string()));
                }
            }
            Action::ScheduleCommit {
                generation,
                delay_ms,
            } => SessionInner::schedule_commit(inner, generation, delay_ms),
            Action::CommitUtterance => {
                for event in [
                    ClientEvent::InputAudioBufferCommit,
                    ClientEvent::ResponseCreate,
                ] {
                    if let Err(e) = inner.transport.send_event(event).await {
                        inner.log(EventSource::Client, "error", Some(e.to_string()));
                    }
                }
            }
            Action::Log { event, detail } => inner.log(EventSource::Client, event, detail),
        }
    }

    /// The tail-commit timer. Holds only a weak handle: if the session is
    /// gone or closed when the timer fires, committing would target a dead
    /// buffer, so the fire becomes a no-op. Supersession by a newer gesture
    /// is handled by the generation check inside the machine.
    fn schedule_commit(inner: &Arc<SessionInner>, generation: u64, delay_ms: u64) {
        let weak: Weak<SessionInner> = Arc::downgrade(inner);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.closed.load(Ordering::SeqCst) {
                return;
            }
            SessionInner::dispatch(&inner, MachineInput::CommitFired { generation }).await;
        });
    }

    fn spawn_event_pump(
        inner: &Arc<SessionInner>,
        mut events: broadcast::Receiver<TransportEvent>,
    ) {
        let weak = Arc::downgrade(inner);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event pump lagged behind the transport");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.closed.load(Ordering::SeqCst) {
                    break;
                }
                SessionInner::on_transport_event(&inner, event).await;
            }
            tracing::debug!("Session event pump ended");
        });
    }

    async fn on_transport_event(inner: &Arc<SessionInner>, event: TransportEvent) {
        match &event {
            TransportEvent::HistoryUpdated { items } => {
                *inner.history.write() = items.clone();
                inner.refresh_usage();
                return;
            }
            TransportEvent::ToolCallRequested {
                name,
                call_id,
                arguments,
            } => {
                SessionInner::run_tool(inner, name, call_id, arguments).await;
                inner.refresh_usage();
                return;
            }
            _ => {}
        }

        if !event.is_delta() {
            inner.log(
                EventSource::Server,
                event.wire_name().to_string(),
                event.detail(),
            );
        }
        inner.refresh_usage();

        SessionInner::dispatch(inner, MachineInput::Transport(event)).await;
    }

    async fn run_tool(inner: &Arc<SessionInner>, name: &str, call_id: &str, arguments: &str) {
        inner.log(
            EventSource::Server,
            "agent_tool_start",
            Some(name.to_string()),
        );

        let parsed: Value = serde_json::from_str(arguments).unwrap_or(Value::Null);
        let output = match inner.tools.execute(name, parsed).await {
            Ok(output) => output.text,
            // The remote caller gets the failure text; local state was left
            // untouched by the registry's schema boundary.
            Err(e) => format!("Error: {}", e),
        };

        inner.log(
            EventSource::Server,
            "agent_tool_end",
            Some(format!("{}: {}", name, truncate(&output, TOOL_RESULT_LOG_CHARS))),
        );

        if let Err(e) = inner.transport.send_tool_result(call_id, &output).await {
            inner.log(EventSource::Client, "error", Some(e.to_string()));
        }
    }

    fn refresh_usage(&self) {
        *self.usage.write() = self.transport.usage();
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
