//! End-to-end session behaviour against a scripted transport
//!
//! Covers the connect sequence, the push-to-talk choreography (tail delay,
//! double-fire latch, barge-in), the no-speech recovery path, tool dispatch,
//! and the telemetry/usage mirrors.

use std::sync::Arc;
use std::time::Duration;

use roots_config::VoiceSessionConfig;
use roots_core::{
    ClientEvent, ConnectionStatus, HistoryItem, TransportEvent, TurnRole, TurnStatus, Usage,
};
use roots_session::{SessionOptions, VoiceSession, NO_SPEECH_FEEDBACK};
use roots_tools::{create_tutor_registry, LessonBoard};
use roots_transport::{MockCredentialProvider, MockOp, MockTransport};

const COMMIT_DELAY_MS: u64 = 50;

struct Fixture {
    session: VoiceSession,
    transport: MockTransport,
    board: Arc<LessonBoard>,
}

fn manual_config() -> VoiceSessionConfig {
    let mut config = VoiceSessionConfig::factory();
    config.press_to_send = true;
    config.commit_delay_ms = COMMIT_DELAY_MS;
    config
}

fn fixture_with(config: VoiceSessionConfig, credentials: MockCredentialProvider) -> Fixture {
    let transport = MockTransport::new();
    let board = Arc::new(LessonBoard::new());
    let registry = Arc::new(create_tutor_registry(board.clone(), "French"));
    let session = VoiceSession::new(
        Arc::new(transport.clone()),
        Arc::new(credentials),
        registry,
        SessionOptions {
            voice_config: config,
            instructions: "teach English".to_string(),
            initial_message: Some("[System Message] Conversation started.".to_string()),
        },
    );
    Fixture {
        session,
        transport,
        board,
    }
}

fn manual_fixture() -> Fixture {
    fixture_with(manual_config(), MockCredentialProvider::ok())
}

/// Let spawned tasks (event pump, timers) run.
async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

/// Let the tail-commit timer fire.
async fn wait_past_commit_delay() {
    tokio::time::sleep(Duration::from_millis(COMMIT_DELAY_MS + 20)).await;
    settle().await;
}

fn log_events(session: &VoiceSession) -> Vec<String> {
    session
        .event_log()
        .into_iter()
        .map(|e| e.event)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_connect_runs_the_manual_setup_sequence() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    assert_eq!(f.session.connection_status(), ConnectionStatus::Connected);

    let ops = f.transport.ops();
    assert_eq!(ops[0], MockOp::Connect);
    // Muted before anything else can open the mic
    assert_eq!(ops[1], MockOp::Mute(true));
    match &ops[2] {
        MockOp::UpdateSession(update) => {
            assert_eq!(update.instructions.as_deref(), Some("teach English"));
            assert_eq!(update.voice.as_deref(), Some("coral"));
            assert!(update.turn_detection.is_none(), "VAD disabled at connect");
        }
        other => panic!("expected the connect session.update, got {:?}", other),
    }
    assert_eq!(
        ops[3],
        MockOp::Message("[System Message] Conversation started.".to_string())
    );

    let events = log_events(&f.session);
    for expected in [
        "session_created",
        "connected",
        "muted_on_connect",
        "vad_disabled",
        "initial_message_sent",
    ] {
        assert!(events.contains(&expected.to_string()), "missing {}", expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_automatic_mode_connect_keeps_vad() {
    let f = fixture_with(VoiceSessionConfig::factory(), MockCredentialProvider::ok());
    f.session.connect().await.unwrap();

    let ops = f.transport.ops();
    // No muted_on_connect in automatic mode
    assert!(!ops.contains(&MockOp::Mute(true)));
    match &ops[1] {
        MockOp::UpdateSession(update) => {
            assert!(update.turn_detection.is_some(), "detector stays on");
        }
        other => panic!("expected session.update, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_credential_failure_is_terminal() {
    let f = fixture_with(manual_config(), MockCredentialProvider::failing("quota"));

    assert!(f.session.connect().await.is_err());
    assert_eq!(f.session.connection_status(), ConnectionStatus::Error);
    assert!(log_events(&f.session).contains(&"connection_error".to_string()));
    // The transport was never touched, and nothing retries
    assert!(f.transport.ops().is_empty());
    assert!(f.session.speak_disabled());
}

#[tokio::test(start_paused = true)]
async fn test_transport_rejection_is_terminal() {
    let f = manual_fixture();
    f.transport.fail_connect("handshake rejected");

    assert!(f.session.connect().await.is_err());
    assert_eq!(f.session.connection_status(), ConnectionStatus::Error);

    let connects = f
        .transport
        .ops()
        .iter()
        .filter(|op| **op == MockOp::Connect)
        .count();
    assert_eq!(connects, 1, "no automatic retry");
}

#[tokio::test(start_paused = true)]
async fn test_press_flow_commits_once_after_the_tail_delay() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.session.press_start().await;
    assert_eq!(f.session.status(), TurnStatus::Listening);
    assert!(f.session.is_pressed());
    assert!(!f.session.is_muted());

    // Pointer-up and pointer-leave both fire for one physical release
    f.session.press_end().await;
    f.session.press_end().await;
    assert!(!f.session.is_pressed());

    // Before the tail delay elapses nothing has been committed
    assert_eq!(f.transport.count_event(&ClientEvent::InputAudioBufferCommit), 0);
    assert_eq!(f.session.status(), TurnStatus::Listening);

    wait_past_commit_delay().await;

    assert_eq!(f.session.status(), TurnStatus::Thinking);
    assert!(f.session.is_muted());
    assert!(f.session.speak_disabled());
    assert_eq!(f.transport.count_event(&ClientEvent::InputAudioBufferCommit), 1);
    assert_eq!(f.transport.count_event(&ClientEvent::ResponseCreate), 1);

    // Commit, then response.create, in that order
    let raw = f.transport.sent_events();
    let commit_pos = raw
        .iter()
        .position(|e| *e == ClientEvent::InputAudioBufferCommit)
        .unwrap();
    let respond_pos = raw
        .iter()
        .position(|e| *e == ClientEvent::ResponseCreate)
        .unwrap();
    assert!(commit_pos < respond_pos);
}

#[tokio::test(start_paused = true)]
async fn test_press_start_during_tail_delay_supersedes_the_commit() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.session.press_start().await;
    f.session.press_end().await;
    // New gesture before the timer fires
    f.session.press_start().await;

    wait_past_commit_delay().await;

    assert_eq!(f.transport.count_event(&ClientEvent::InputAudioBufferCommit), 0);
    assert_eq!(f.session.status(), TurnStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn test_barge_in_interrupts_before_listening() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.emit(TransportEvent::OutputAudioStarted);
    settle().await;
    assert_eq!(f.session.status(), TurnStatus::Speaking);

    f.session.press_start().await;
    assert_eq!(f.session.status(), TurnStatus::Listening);

    let ops = f.transport.ops();
    let interrupt_pos = ops.iter().position(|op| *op == MockOp::Interrupt).unwrap();
    let unmute_pos = ops.iter().position(|op| *op == MockOp::Mute(false)).unwrap();
    assert!(interrupt_pos < unmute_pos, "interrupt precedes the hot mic");
    assert!(log_events(&f.session).contains(&"user_interrupt".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_silent_response_sets_the_recovery_hint() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.session.press_start().await;
    f.session.press_end().await;
    wait_past_commit_delay().await;

    f.transport.emit(TransportEvent::ResponseCreated {
        response_id: Some("resp_1".into()),
    });
    f.transport.emit(TransportEvent::ResponseDone {
        response_id: Some("resp_1".into()),
    });
    settle().await;

    assert_eq!(f.session.status(), TurnStatus::Idle);
    assert_eq!(f.session.feedback().as_deref(), Some(NO_SPEECH_FEEDBACK));
    assert!(log_events(&f.session).contains(&"no_speech_detected".to_string()));

    // The next gesture clears the hint
    f.session.press_start().await;
    assert_eq!(f.session.feedback(), None);
}

#[tokio::test(start_paused = true)]
async fn test_audible_response_leaves_no_hint() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.session.press_start().await;
    f.session.press_end().await;
    wait_past_commit_delay().await;

    f.transport.emit(TransportEvent::ResponseCreated { response_id: None });
    f.transport.emit(TransportEvent::OutputAudioStarted);
    f.transport.emit(TransportEvent::ResponseDone { response_id: None });
    settle().await;

    assert_eq!(f.session.status(), TurnStatus::Idle);
    assert_eq!(f.session.feedback(), None);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_the_pending_commit() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.session.press_start().await;
    f.session.press_end().await;
    f.session.close();

    tokio::time::sleep(Duration::from_millis(COMMIT_DELAY_MS * 3)).await;
    settle().await;

    assert_eq!(f.transport.count_event(&ClientEvent::InputAudioBufferCommit), 0);
    assert!(f.transport.is_closed());
    assert!(log_events(&f.session).contains(&"session_closed".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_session_releases_the_transport() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();
    let transport = f.transport.clone();
    drop(f);
    assert!(transport.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_history_and_usage_mirror_the_transport() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.set_usage(Usage {
        requests: 2,
        input_tokens: 100,
        output_tokens: 40,
        total_tokens: 140,
    });
    let items = vec![
        HistoryItem::new("item_1", TurnRole::User, "bonjour").completed(),
        HistoryItem::new("item_2", TurnRole::Assistant, "Hello!"),
    ];
    f.transport.emit(TransportEvent::HistoryUpdated {
        items: items.clone(),
    });
    settle().await;

    assert_eq!(f.session.history(), items);
    assert_eq!(f.session.usage().total_tokens, 140);
    // History replaces are surfaced as state, not telemetry noise
    assert!(!log_events(&f.session).contains(&"history_updated".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_tool_calls_round_trip_through_the_registry() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.emit(TransportEvent::ToolCallRequested {
        name: "rate_pronunciation".to_string(),
        call_id: "call_1".to_string(),
        arguments: "{\"rating\":2}".to_string(),
    });
    settle().await;

    assert_eq!(f.board.rating(), Some(2));

    let tool_result = f.transport.ops().into_iter().find_map(|op| match op {
        MockOp::ToolResult { call_id, output } => Some((call_id, output)),
        _ => None,
    });
    let (call_id, output) = tool_result.expect("a tool result was sent back");
    assert_eq!(call_id, "call_1");
    assert!(output.contains("Set pronunciation rating to 2"));

    let events = log_events(&f.session);
    assert!(events.contains(&"agent_tool_start".to_string()));
    assert!(events.contains(&"agent_tool_end".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_tool_arguments_reach_the_caller_without_mutation() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.emit(TransportEvent::ToolCallRequested {
        name: "rate_pronunciation".to_string(),
        call_id: "call_2".to_string(),
        arguments: "{\"rating\":7}".to_string(),
    });
    settle().await;

    assert_eq!(f.board.rating(), None, "schema boundary blocked the write");

    let output = f
        .transport
        .ops()
        .into_iter()
        .find_map(|op| match op {
            MockOp::ToolResult { output, .. } => Some(output),
            _ => None,
        })
        .unwrap();
    assert!(output.starts_with("Error:"));
}

#[tokio::test(start_paused = true)]
async fn test_delta_events_stay_out_of_the_log() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.emit(TransportEvent::Other {
        event_type: "response.output_audio.delta".to_string(),
    });
    f.transport.emit(TransportEvent::Other {
        event_type: "session.updated".to_string(),
    });
    settle().await;

    let events = log_events(&f.session);
    assert!(!events.contains(&"response.output_audio.delta".to_string()));
    assert!(events.contains(&"session.updated".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_speech_offsets_land_in_the_log_detail() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.emit(TransportEvent::SpeechStarted {
        audio_start_ms: Some(250),
    });
    settle().await;

    let entry = f
        .session
        .event_log()
        .into_iter()
        .find(|e| e.event == "input_audio_buffer.speech_started")
        .unwrap();
    assert_eq!(entry.detail.as_deref(), Some("at 250ms"));
}

#[tokio::test(start_paused = true)]
async fn test_config_update_failure_is_swallowed() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    f.transport.fail_sends(true);
    let mut config = manual_config();
    config.noise_reduction = roots_config::NoiseReductionKind::FarField;
    f.session.update_voice_config(config).await;

    let events = log_events(&f.session);
    assert!(events.contains(&"config_update_error".to_string()));
    // The session is still usable
    f.transport.fail_sends(false);
    f.session.press_start().await;
    assert_eq!(f.session.status(), TurnStatus::Listening);
}

#[tokio::test(start_paused = true)]
async fn test_config_update_success_reasserts_disabled_vad() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    let mut config = manual_config();
    config.noise_reduction = roots_config::NoiseReductionKind::FarField;
    f.session.update_voice_config(config).await;

    let update = f
        .transport
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            MockOp::UpdateSession(update) => Some(update),
            _ => None,
        })
        .last()
        .unwrap();
    assert!(update.turn_detection.is_none(), "manual mode keeps VAD off");
    assert!(log_events(&f.session).contains(&"config_updated".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_mute_mirrors_listening_through_a_full_cycle() {
    let f = manual_fixture();
    f.session.connect().await.unwrap();

    let check = |expect_hot: bool, session: &VoiceSession| {
        assert_eq!(
            session.is_muted(),
            !expect_hot,
            "mute must be the negation of listening"
        );
        assert_eq!(session.status() == TurnStatus::Listening, expect_hot);
    };

    check(false, &f.session);
    f.session.press_start().await;
    check(true, &f.session);
    f.session.press_end().await;
    check(true, &f.session); // hot through the tail delay
    wait_past_commit_delay().await;
    check(false, &f.session);

    f.transport.emit(TransportEvent::ResponseCreated { response_id: None });
    f.transport.emit(TransportEvent::OutputAudioStarted);
    settle().await;
    check(false, &f.session);

    f.transport.emit(TransportEvent::ResponseDone { response_id: None });
    settle().await;
    check(false, &f.session);
}
