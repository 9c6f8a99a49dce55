//! Roots voice tutor - terminal demo
//!
//! Wires the library crates together end to end: settings, credential
//! exchange, realtime transport, tool registry and the voice session, with
//! stdin lines standing in for the press-to-speak control.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use roots_config::{
    load_settings, FileSettingsStore, LanguagePreference, Settings, VoiceSettings,
};
use roots_session::{SessionOptions, VoiceSession};
use roots_tools::{create_tutor_registry, practice_instructions, LessonBoard};
use roots_transport::{HttpCredentialProvider, RealtimeClient};

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.observability.log_level.clone().into());

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Display name for a stored language code
fn language_display_name(code: &str) -> &'static str {
    match code {
        "fr" => "French",
        "ar" => "Arabic",
        "uk" => "Ukrainian",
        "fa" => "Farsi",
        "ps" => "Pashto",
        "ti" => "Tigrinya",
        "so" => "Somali",
        "pt" => "Portuguese",
        _ => "French",
    }
}

const HELP: &str = "\
commands:
  press    hold the speak control (unmutes, starts listening)
  release  let go of the speak control (commits after the tail delay)
  board    show the current phrase, rating and feedback
  status   show turn/connection status and usage counters
  log      print the telemetry log
  lang XX  set the learner language code (fr, ar, uk, ...)
  quit     close the session and exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("ROOTS_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };
    init_tracing(&settings);

    let store = Arc::new(FileSettingsStore::open(&settings.storage.path));
    let voice_settings = VoiceSettings::load(store.clone());
    let language = LanguagePreference::new(store.clone());
    let language_name =
        language_display_name(language.language_code().as_deref().unwrap_or("fr"));

    let board = Arc::new(LessonBoard::new());
    let registry = Arc::new(create_tutor_registry(board.clone(), language_name));

    let credentials = Arc::new(
        HttpCredentialProvider::new(
            &settings.backend.endpoint,
            Duration::from_secs(settings.backend.request_timeout_seconds),
        )
        .context("building credential provider")?,
    );
    let transport = Arc::new(RealtimeClient::default());

    // The demo drives push-to-talk regardless of the saved default, the
    // rest of the saved config applies as-is.
    let mut voice_config = voice_settings.saved().clone();
    voice_config.press_to_send = true;

    let session = VoiceSession::new(
        transport,
        credentials,
        registry,
        SessionOptions {
            voice_config,
            instructions: practice_instructions(language_name),
            initial_message: Some(format!(
                "[System Message] Conversation started. The user speaks {}. Greet them in {}, then begin teaching English phrases.",
                language_name, language_name
            )),
        },
    );

    println!("connecting to {} ...", settings.backend.endpoint);
    if let Err(e) = session.connect().await {
        eprintln!("connection error, please try again ({})", e);
        // Terminal for this session instance; the loop below still allows
        // inspecting the log before quitting.
    } else {
        println!("connected. {}", HELP);
    }

    // Print status transitions and recovery hints as they happen.
    let mut status_rx = session.watch_status();
    let mut feedback_rx = session.watch_feedback();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("  [{}]", *status_rx.borrow());
                }
                changed = feedback_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(hint) = feedback_rx.borrow().clone() {
                        println!("  {}", hint);
                    }
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "press" => session.press_start().await,
            "release" => session.press_end().await,
            "board" => {
                match board.phrase() {
                    Some(phrase) => println!(
                        "  {}\n  {}\n  {}",
                        phrase.english_text, phrase.phonetic_text, phrase.native_text
                    ),
                    None => println!("  no phrase yet"),
                }
                if let Some(rating) = board.rating() {
                    println!("  rating: {}", "*".repeat(rating as usize));
                }
                if let Some(feedback) = board.feedback() {
                    println!("  feedback: {}", feedback);
                }
            }
            "status" => {
                let usage = session.usage();
                println!(
                    "  connection: {}  turn: {}  muted: {}  requests: {}  tokens: {}",
                    session.connection_status(),
                    session.status(),
                    session.is_muted(),
                    usage.requests,
                    usage.total_tokens,
                );
            }
            "log" => println!("{}", session.export_event_log()),
            "quit" | "exit" => break,
            "" => {}
            other => {
                if let Some(code) = other.strip_prefix("lang ") {
                    match language.set_language_code(code.trim()) {
                        Ok(()) => println!(
                            "  language saved: {} (takes effect next session)",
                            language_display_name(code.trim())
                        ),
                        Err(e) => eprintln!("  could not save language: {}", e),
                    }
                } else {
                    println!("{}", HELP);
                }
            }
        }
    }

    session.close();
    Ok(())
}
