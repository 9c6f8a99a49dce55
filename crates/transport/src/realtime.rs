//! WebSocket realtime client
//!
//! Implements `RealtimeTransport` over the vendor's realtime event channel.
//! One reader task decodes inbound frames, keeps the transcript and usage
//! mirrors current, and fans events out over a broadcast channel; one writer
//! task owns the sink. Outbound audio is gated client-side by the mute flag,
//! so muting never tears down the connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use roots_core::{
    ClientEvent, ConversationItemPayload, EphemeralCredential, Error, HistoryItem, ItemStatus,
    RealtimeTransport, Result, SessionUpdate, TransportEvent, TurnRole, Usage,
};

/// Default realtime endpoint
pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime?model=gpt-realtime";

const EVENT_CHANNEL_CAPACITY: usize = 256;
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

struct ClientInner {
    url: String,
    events: broadcast::Sender<TransportEvent>,
    outbound: Mutex<Option<mpsc::Sender<Message>>>,
    history: Mutex<Vec<HistoryItem>>,
    usage: RwLock<Usage>,
    muted: AtomicBool,
    shutdown: watch::Sender<bool>,
}

/// Realtime transport over a WebSocket connection
pub struct RealtimeClient {
    inner: Arc<ClientInner>,
}

impl Default for RealtimeClient {
    fn default() -> Self {
        Self::new(DEFAULT_REALTIME_URL)
    }
}

impl RealtimeClient {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(ClientInner {
                url: url.into(),
                events,
                outbound: Mutex::new(None),
                history: Mutex::new(Vec::new()),
                usage: RwLock::new(Usage::default()),
                muted: AtomicBool::new(false),
                shutdown,
            }),
        }
    }

    /// Append captured audio to the input buffer. Dropped while muted.
    pub async fn send_audio(&self, pcm: &[u8]) -> Result<()> {
        if self.inner.muted.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.send_event(ClientEvent::InputAudioBufferAppend {
            audio: BASE64.encode(pcm),
        })
        .await
    }

    async fn send_json(&self, event: &ClientEvent) -> Result<()> {
        let sender = self
            .inner
            .outbound
            .lock()
            .clone()
            .ok_or(Error::NotConnected)?;
        let text = serde_json::to_string(event)
            .map_err(|e| Error::Transport(format!("encode failed: {}", e)))?;
        sender
            .send(Message::Text(text))
            .await
            .map_err(|_| Error::NotConnected)
    }
}

impl ClientInner {
    /// Decode one inbound frame, maintain the transcript and usage mirrors,
    /// and emit the resulting events.
    fn handle_inbound(&self, value: &Value) {
        let event_type = value.get("type").and_then(|t| t.as_str()).unwrap_or("");

        let history_changed = match event_type {
            "conversation.item.created" | "conversation.item.added" => {
                match decode_history_item(value.get("item")) {
                    Some(item) => {
                        let mut history = self.history.lock();
                        if !history.iter().any(|existing| existing.id == item.id) {
                            history.push(item);
                        }
                        true
                    }
                    None => false,
                }
            }
            "conversation.item.done" => match decode_history_item(value.get("item")) {
                Some(item) => {
                    let mut history = self.history.lock();
                    match history.iter_mut().find(|e| e.id == item.id) {
                        Some(existing) => {
                            if !item.text.is_empty() {
                                existing.text = item.text;
                            }
                            existing.status = ItemStatus::Completed;
                        }
                        None => history.push(item.completed()),
                    }
                    true
                }
                None => false,
            },
            "conversation.item.input_audio_transcription.completed" => {
                let item_id = value.get("item_id").and_then(|v| v.as_str());
                let transcript = value.get("transcript").and_then(|v| v.as_str());
                if let (Some(id), Some(text)) = (item_id, transcript) {
                    let mut history = self.history.lock();
                    if let Some(existing) = history.iter_mut().find(|e| e.id == id) {
                        existing.text = text.to_string();
                    }
                    true
                } else {
                    false
                }
            }
            "response.done" => {
                record_usage(value, &self.usage);
                false
            }
            _ => false,
        };

        let _ = self.events.send(TransportEvent::from_wire(value));

        if history_changed {
            let items = self.history.lock().clone();
            let _ = self.events.send(TransportEvent::HistoryUpdated { items });
        }
    }
}

#[async_trait]
impl RealtimeTransport for RealtimeClient {
    async fn connect(&self, credential: &EphemeralCredential) -> Result<()> {
        let mut request = self
            .inner
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::Connection(format!("bad endpoint: {}", e)))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.value))
            .map_err(|e| Error::Connection(format!("bad credential: {}", e)))?;
        request.headers_mut().insert("Authorization", bearer);
        request
            .headers_mut()
            .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        tracing::info!(url = %self.inner.url, "Realtime transport connected");

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        *self.inner.outbound.lock() = Some(outbound_tx);

        // Writer: drains the outbound queue until close.
        let mut shutdown_rx = self.inner.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe = outbound_rx.recv() => match maybe {
                        Some(message) => {
                            if let Err(e) = sink.send(message).await {
                                tracing::warn!("Outbound send failed: {}", e);
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            let _ = sink.close().await;
            tracing::debug!("Realtime writer task ended");
        });

        // Reader: decodes frames into transport events.
        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.inner.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe = source.next() => match maybe {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<Value>(&text) {
                                Ok(value) => inner.handle_inbound(&value),
                                Err(e) => tracing::debug!("Undecodable frame: {}", e),
                            }
                        }
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Realtime transport closed by peer");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = inner.events.send(TransportEvent::Error {
                                message: e.to_string(),
                            });
                            break;
                        }
                    },
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Realtime reader task ended");
        });

        Ok(())
    }

    fn mute(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::SeqCst);
    }

    fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::SeqCst)
    }

    async fn interrupt(&self) -> Result<()> {
        self.send_event(ClientEvent::ResponseCancel).await
    }

    async fn send_event(&self, event: ClientEvent) -> Result<()> {
        self.send_json(&event).await
    }

    async fn update_session(&self, update: SessionUpdate) -> Result<()> {
        self.send_event(ClientEvent::SessionUpdate { session: update })
            .await
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        self.send_event(ClientEvent::ConversationItemCreate {
            item: ConversationItemPayload::user_text(text),
        })
        .await?;
        self.send_event(ClientEvent::ResponseCreate).await
    }

    async fn send_tool_result(&self, call_id: &str, output: &str) -> Result<()> {
        self.send_event(ClientEvent::ConversationItemCreate {
            item: ConversationItemPayload::FunctionCallOutput {
                call_id: call_id.to_string(),
                output: output.to_string(),
            },
        })
        .await?;
        self.send_event(ClientEvent::ResponseCreate).await
    }

    fn close(&self) {
        *self.inner.outbound.lock() = None;
        let _ = self.inner.shutdown.send(true);
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    fn usage(&self) -> Usage {
        *self.inner.usage.read()
    }
}

fn decode_history_item(item: Option<&Value>) -> Option<HistoryItem> {
    let item = item?;
    if item.get("type").and_then(|t| t.as_str()) != Some("message") {
        return None;
    }
    let id = item.get("id")?.as_str()?.to_string();
    let role = TurnRole::from_wire(item.get("role").and_then(|r| r.as_str()).unwrap_or(""));
    let text = item
        .get("content")
        .and_then(|c| c.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("transcript")
                        .or_else(|| p.get("text"))
                        .and_then(|t| t.as_str())
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Some(HistoryItem::new(id, role, text))
}

fn record_usage(value: &Value, usage: &RwLock<Usage>) {
    // Missing accounting right after connect is expected; keep the stale
    // counters and move on.
    let Some(report) = value.get("response").and_then(|r| r.get("usage")) else {
        return;
    };
    let token = |key: &str| report.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
    usage.write().record_response(
        token("input_tokens"),
        token("output_tokens"),
        token("total_tokens"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_history_item() {
        let item = decode_history_item(Some(&json!({
            "type": "message",
            "id": "item_1",
            "role": "assistant",
            "content": [{ "type": "output_audio", "transcript": "Bonjour!" }],
        })))
        .unwrap();
        assert_eq!(item.id, "item_1");
        assert_eq!(item.role, TurnRole::Assistant);
        assert_eq!(item.text, "Bonjour!");
    }

    #[test]
    fn test_non_message_items_ignored() {
        assert!(decode_history_item(Some(&json!({
            "type": "function_call",
            "id": "item_2",
        })))
        .is_none());
    }

    #[test]
    fn test_record_usage_accumulates_and_tolerates_absence() {
        let usage = RwLock::new(Usage::default());

        // No usage block at all: stale counters retained
        record_usage(&json!({ "type": "response.done" }), &usage);
        assert_eq!(*usage.read(), Usage::default());

        record_usage(
            &json!({
                "response": { "usage": { "input_tokens": 10, "output_tokens": 5, "total_tokens": 15 } }
            }),
            &usage,
        );
        let snapshot = *usage.read();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_history_replace_on_transcription() {
        let client = RealtimeClient::new("wss://example.invalid/v1/realtime");
        let mut rx = client.subscribe();

        client.inner.handle_inbound(&json!({
            "type": "conversation.item.created",
            "item": {
                "type": "message",
                "id": "item_1",
                "role": "user",
                "content": [],
            },
        }));
        // Raw event first, then the synthesised history replace
        assert!(matches!(rx.recv().await.unwrap(), TransportEvent::Other { .. }));
        match rx.recv().await.unwrap() {
            TransportEvent::HistoryUpdated { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].text, "");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        client.inner.handle_inbound(&json!({
            "type": "conversation.item.input_audio_transcription.completed",
            "item_id": "item_1",
            "transcript": "hello there",
        }));
        let _raw = rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            TransportEvent::HistoryUpdated { items } => {
                assert_eq!(items[0].text, "hello there");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sends_require_connection() {
        let client = RealtimeClient::new("wss://example.invalid/v1/realtime");
        let err = client
            .send_event(ClientEvent::ResponseCreate)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
