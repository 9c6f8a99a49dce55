//! Turn-taking state machine
//!
//! One transition function (state × input → actions) covers both operating
//! modes, so the automatic and manual paths can never drift apart. The
//! machine is pure apart from its own fields: it never touches the transport,
//! it only asks the driver to, which makes every transition testable in
//! isolation.
//!
//! Manual mode carries three pieces of guard state that address real races:
//! - the press-end latch: pointer-up and pointer-leave both fire for one
//!   physical release, and only the first may commit
//! - the commit generation: the tail-delay timer may fire after a new
//!   press-start superseded it, or after teardown, and must then do nothing
//! - the had-audio flag: a response that completes without ever starting
//!   audio output is the no-speech case and needs operator feedback, not an
//!   error

use roots_core::{ConnectionStatus, TransportEvent, TurnStatus};

/// Recovery hint shown when a committed utterance produced no audio response
pub const NO_SPEECH_FEEDBACK: &str = "Didn't catch that. Hold to speak again.";

/// Operating mode, fixed for the life of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The remote detector finds speech boundaries
    Automatic,
    /// Push-to-talk: the client marks utterance boundaries explicitly
    Manual,
}

/// Inputs the machine reduces over
#[derive(Debug, Clone)]
pub enum MachineInput {
    /// The user pressed the speak control
    PressStart,
    /// The user released the speak control (or their pointer left it)
    PressEnd,
    /// The tail-commit timer fired
    CommitFired { generation: u64 },
    /// An event arrived from the transport
    Transport(TransportEvent),
}

/// Side effects the driver must perform, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ClearFeedback,
    SetFeedback(String),
    Mute(bool),
    /// Cancel in-flight assistant speech (barge-in)
    Interrupt,
    /// Start the cancellable tail-commit timer
    ScheduleCommit { generation: u64, delay_ms: u64 },
    /// Send `input_audio_buffer.commit` followed by `response.create`
    CommitUtterance,
    /// Append a client-tagged telemetry entry
    Log {
        event: &'static str,
        detail: Option<String>,
    },
}

/// The reducer and its context
#[derive(Debug)]
pub struct TurnMachine {
    mode: SessionMode,
    connection: ConnectionStatus,
    status: TurnStatus,
    commit_delay_ms: u64,
    /// Set once a press-end has been accepted for the current gesture
    press_latched: bool,
    /// Whether the current response produced any audio output
    had_audio_in_response: bool,
    /// Generation of the pending tail-commit timer, if one is live
    pending_commit: Option<u64>,
    next_generation: u64,
}

impl TurnMachine {
    pub fn new(mode: SessionMode, commit_delay_ms: u64) -> Self {
        Self {
            mode,
            connection: ConnectionStatus::Connecting,
            status: TurnStatus::Idle,
            commit_delay_ms,
            press_latched: false,
            had_audio_in_response: false,
            pending_commit: None,
            next_generation: 0,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn set_connection(&mut self, connection: ConnectionStatus) {
        self.connection = connection;
    }

    /// Live config updates may change the tail delay mid-session.
    pub fn set_commit_delay(&mut self, delay_ms: u64) {
        self.commit_delay_ms = delay_ms;
    }

    /// In manual mode the mic is hot only while actively listening.
    pub fn is_muted(&self) -> bool {
        self.status != TurnStatus::Listening
    }

    /// The press control is unusable while disconnected or while a response
    /// is being generated.
    pub fn speak_disabled(&self) -> bool {
        self.connection != ConnectionStatus::Connected || self.status == TurnStatus::Thinking
    }

    /// Drop any scheduled commit so a late timer fire is a no-op.
    pub fn cancel_pending_commit(&mut self) {
        self.pending_commit = None;
    }

    /// Reduce one input to the actions the driver must perform.
    pub fn handle(&mut self, input: MachineInput) -> Vec<Action> {
        match input {
            MachineInput::PressStart => self.on_press_start(),
            MachineInput::PressEnd => self.on_press_end(),
            MachineInput::CommitFired { generation } => self.on_commit_fired(generation),
            MachineInput::Transport(event) => self.on_transport(event),
        }
    }

    fn on_press_start(&mut self) -> Vec<Action> {
        if self.mode != SessionMode::Manual {
            return Vec::new();
        }
        if self.connection != ConnectionStatus::Connected || self.status == TurnStatus::Thinking {
            return Vec::new();
        }

        let mut actions = vec![Action::ClearFeedback];

        if self.status == TurnStatus::Speaking {
            actions.push(Action::Interrupt);
            actions.push(Action::Log {
                event: "user_interrupt",
                detail: None,
            });
        }

        // A new gesture supersedes any commit still waiting on its tail delay
        // and re-arms the press-end latch.
        self.pending_commit = None;
        self.press_latched = false;

        actions.push(Action::Mute(false));
        self.status = TurnStatus::Listening;
        actions.push(Action::Log {
            event: "press_start",
            detail: Some("unmuted, listening".to_string()),
        });

        actions
    }

    fn on_press_end(&mut self) -> Vec<Action> {
        if self.mode != SessionMode::Manual {
            return Vec::new();
        }
        // Stray pointer-up events outside a listening window must not commit.
        if self.status != TurnStatus::Listening {
            return Vec::new();
        }
        // Pointer-up and pointer-leave both fire for one release.
        if self.press_latched {
            return Vec::new();
        }
        self.press_latched = true;

        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending_commit = Some(generation);

        // The mic stays hot through the tail delay so the last audio frames
        // reach the server before the buffer is closed.
        vec![
            Action::Log {
                event: "press_end",
                detail: Some(format!("commit in {}ms", self.commit_delay_ms)),
            },
            Action::ScheduleCommit {
                generation,
                delay_ms: self.commit_delay_ms,
            },
        ]
    }

    fn on_commit_fired(&mut self, generation: u64) -> Vec<Action> {
        if self.pending_commit != Some(generation) || self.status != TurnStatus::Listening {
            return Vec::new();
        }
        self.pending_commit = None;

        self.status = TurnStatus::Thinking;
        vec![
            Action::Mute(true),
            Action::Log {
                event: "commit",
                detail: Some("muted, committing".to_string()),
            },
            Action::CommitUtterance,
        ]
    }

    fn on_transport(&mut self, event: TransportEvent) -> Vec<Action> {
        match event {
            TransportEvent::ResponseCreated { .. } => {
                self.had_audio_in_response = false;
                Vec::new()
            }
            TransportEvent::OutputAudioStarted => {
                self.had_audio_in_response = true;
                self.status = TurnStatus::Speaking;
                Vec::new()
            }
            TransportEvent::ResponseDone { .. } => {
                let was_thinking = self.status == TurnStatus::Thinking;
                self.status = TurnStatus::Idle;

                if self.mode == SessionMode::Manual && was_thinking && !self.had_audio_in_response
                {
                    // The committed utterance produced nothing audible: a
                    // business outcome, not an error.
                    return vec![
                        Action::SetFeedback(NO_SPEECH_FEEDBACK.to_string()),
                        Action::Log {
                            event: "no_speech_detected",
                            detail: None,
                        },
                    ];
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
