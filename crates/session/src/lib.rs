//! Voice-session lifecycle and turn-taking for the Roots voice tutor
//!
//! The interesting work lives in three places:
//! - `machine`: one reducer-style transition function covering both the
//!   automatic (remote VAD) and manual (push-to-talk) modes
//! - `telemetry`: the capped, source-tagged event log and the usage mirror
//! - `session`: the driver that owns the transport, interprets the machine's
//!   actions, schedules the cancellable tail-commit timer, and dispatches
//!   tool invocations

pub mod machine;
pub mod session;
pub mod telemetry;

pub use machine::{Action, MachineInput, SessionMode, TurnMachine, NO_SPEECH_FEEDBACK};
pub use session::{SessionOptions, VoiceSession};
pub use telemetry::{EventLog, EventLogEntry, EventSource, EVENT_LOG_CAPACITY};
