//! WebSocket client over `tokio-tungstenite`.
//!
//! A background tokio task owns the connection. The public API talks to it
//! over an mpsc command channel, and events come back on a bounded event
//! channel. Reconnection uses exponential backoff with jitter; tracked
//! subscriptions are replayed after every reconnect, and messages sent while
//! disconnected are queued and flushed once the socket is open again.

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::shared::MarketId;
use crate::ws::{MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Send(MessageOut),
    Disconnect,
}

enum DisconnectReason {
    UserRequested,
    NormalClose,
    Error(String),
}

struct TaskState {
    config: WsConfig,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    subscribed: Vec<MarketId>,
    pending_messages: Vec<MessageOut>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        let _ = self.event_tx.try_send(event);
    }

    fn should_reconnect(&self) -> bool {
        self.config.reconnect
            && self.reconnect_attempts < self.config.max_reconnect_attempts
    }
}

/// Cloneable handle for driving an already-connected [`WsClient`] whose
/// event stream is being drained elsewhere (typically the dispatcher task).
#[derive(Clone)]
pub struct WsController {
    cmd_tx: mpsc::Sender<Command>,
}

impl WsController {
    fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        self.cmd_tx.try_send(Command::Send(msg)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                WsError::SendFailed("command channel full".into())
            }
            mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
        })
    }

    pub fn subscribe(&self, market_id: MarketId) -> Result<(), WsError> {
        self.send(MessageOut::Subscribe { market_id })
    }

    pub fn unsubscribe(&self, market_id: MarketId) -> Result<(), WsError> {
        self.send(MessageOut::Unsubscribe { market_id })
    }

    /// Graceful close. The background task sends a close frame and exits
    /// without reconnecting.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect).await;
    }
}

/// WebSocket client for the matcher stream.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    /// Spawn the background connection task. Idempotent while a task is
    /// running; after the task has terminated (requested close or terminal
    /// offline), calling this again starts a fresh connection.
    pub fn connect(&mut self) {
        if self
            .task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            return;
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            subscribed: Vec::new(),
            pending_messages: Vec::new(),
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
    }

    /// Disconnect and wait for the background task to finish.
    pub async fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }
        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
    }

    /// Send a message via the background task. Queued for flush-on-reconnect
    /// if the socket is currently down.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    /// Subscribe to one market's stream.
    pub fn subscribe(&self, market_id: MarketId) -> Result<(), WsError> {
        self.send(MessageOut::Subscribe { market_id })
    }

    /// Unsubscribe from one market's stream.
    pub fn unsubscribe(&self, market_id: MarketId) -> Result<(), WsError> {
        self.send(MessageOut::Unsubscribe { market_id })
    }

    /// A handle for driving the connection after ownership of the client
    /// moves into the event-draining task.
    pub fn controller(&self) -> Result<WsController, WsError> {
        match &self.cmd_tx {
            Some(tx) => Ok(WsController { cmd_tx: tx.clone() }),
            None => Err(WsError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// A stream of events from the connection. Borrows `self`; drop it
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        let (sink, stream) = match attempt_connect(&state.config.url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("websocket connection failed: {}", e);
                state.emit(WsEvent::Error(format!("connection failed: {}", e)));

                if state.should_reconnect() {
                    backoff_sleep(&mut state).await;
                    if drain_commands_to_pending(&mut state) {
                        state
                            .ready_state
                            .store(ReadyState::Closed as u16, Ordering::SeqCst);
                        return;
                    }
                    continue;
                }
                state
                    .ready_state
                    .store(ReadyState::Closed as u16, Ordering::SeqCst);
                state.emit(WsEvent::Offline);
                return;
            }
        };

        state.reconnect_attempts = 0;
        state
            .ready_state
            .store(ReadyState::Open as u16, Ordering::SeqCst);
        state.emit(WsEvent::Connected);

        let mut sink = sink;
        flush_pending(&mut sink, &mut state.pending_messages).await;
        resubscribe_all(&mut sink, &state.subscribed).await;

        let reason = run_connected(&mut state, sink, stream).await;

        state
            .ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);

        match reason {
            DisconnectReason::UserRequested | DisconnectReason::NormalClose => return,
            DisconnectReason::Error(_) => {
                if state.should_reconnect() {
                    state
                        .ready_state
                        .store(ReadyState::Connecting as u16, Ordering::SeqCst);
                    backoff_sleep(&mut state).await;
                    if drain_commands_to_pending(&mut state) {
                        state
                            .ready_state
                            .store(ReadyState::Closed as u16, Ordering::SeqCst);
                        return;
                    }
                    continue;
                }
                state.emit(WsEvent::Offline);
                return;
            }
        }
    }
}

/// The inner connected loop — runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        match serde_json::from_str::<MessageIn>(text_str) {
                            Ok(msg_in) => state.emit(WsEvent::Message(msg_in)),
                            Err(e) => {
                                tracing::warn!(
                                    "ws deserialization error: {} — raw: {}",
                                    e,
                                    text_str
                                );
                                state.emit(WsEvent::Error(format!(
                                    "deserialization error: {}",
                                    e
                                )));
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(WsEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        });
                        return match code {
                            1000 => DisconnectReason::NormalClose,
                            _ => DisconnectReason::Error(reason),
                        };
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame — ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("websocket error: {}", reason);
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: reason.clone(),
                        });
                        return DisconnectReason::Error(reason);
                    }
                    None => {
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: "stream ended".into(),
                        });
                        return DisconnectReason::Error("stream ended".into());
                    }
                }
            }

            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        track_subscription(&mut state.subscribed, &msg_out);
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("send failed: {}", e);
                        }
                    }
                    Some(Command::Disconnect) => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "client disconnect".into(),
                        }))).await;
                        return DisconnectReason::UserRequested;
                    }
                    None => {
                        // WsClient dropped — clean exit
                        return DisconnectReason::UserRequested;
                    }
                }
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

async fn send_msg(
    sink: &mut SplitSink<WsStream, Message>,
    msg: &MessageOut,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "no close frame".into()),
    }
}

// ─── Subscription tracking ───────────────────────────────────────────────────

fn track_subscription(subs: &mut Vec<MarketId>, msg: &MessageOut) {
    match msg {
        MessageOut::Subscribe { market_id } => {
            if !subs.contains(market_id) {
                tracing::debug!(market = %market_id, "tracking subscription");
                subs.push(market_id.clone());
            }
        }
        MessageOut::Unsubscribe { market_id } => {
            subs.retain(|m| m != market_id);
        }
    }
}

async fn resubscribe_all(sink: &mut SplitSink<WsStream, Message>, subs: &[MarketId]) {
    if subs.is_empty() {
        return;
    }
    tracing::info!("resubscribing to {} market(s)", subs.len());
    for market_id in subs {
        let msg = MessageOut::Subscribe {
            market_id: market_id.clone(),
        };
        if let Err(e) = send_msg(sink, &msg).await {
            tracing::warn!("failed to resubscribe: {}", e);
        }
    }
}

// ─── Message queue ───────────────────────────────────────────────────────────

async fn flush_pending(
    sink: &mut SplitSink<WsStream, Message>,
    pending: &mut Vec<MessageOut>,
) {
    if pending.is_empty() {
        return;
    }
    tracing::info!("flushing {} pending message(s)", pending.len());
    let messages = std::mem::take(pending);
    for msg in &messages {
        if let Err(e) = send_msg(sink, msg).await {
            tracing::warn!("failed to flush pending message: {}", e);
        }
    }
}

/// Drain commands that arrived during backoff into the pending queue.
/// Returns true if a disconnect was requested.
fn drain_commands_to_pending(state: &mut TaskState) -> bool {
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Send(msg) => {
                track_subscription(&mut state.subscribed, &msg);
                state.pending_messages.push(msg);
            }
            Command::Disconnect => return true,
        }
    }
    false
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

async fn backoff_sleep(state: &mut TaskState) {
    state.reconnect_attempts += 1;

    let exp = (state.reconnect_attempts - 1).min(10);
    let base = state
        .config
        .base_reconnect_delay_ms
        .saturating_mul(1u32 << exp);
    let jitter = rand::random::<u32>() % 500;
    let delay = base
        .saturating_add(jitter)
        .min(state.config.max_reconnect_delay_ms);

    tracing::info!(
        "reconnect attempt {}/{} in {}ms",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay
    );

    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_client_new() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_send_when_not_connected() {
        let client = WsClient::new(WsConfig::default());
        let result = client.subscribe(MarketId::from("m1"));
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_track_subscription_dedupes() {
        let mut subs = Vec::new();
        let msg = MessageOut::Subscribe {
            market_id: MarketId::from("m1"),
        };
        track_subscription(&mut subs, &msg);
        track_subscription(&mut subs, &msg);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_track_subscription_remove() {
        let mut subs = Vec::new();
        track_subscription(
            &mut subs,
            &MessageOut::Subscribe {
                market_id: MarketId::from("m1"),
            },
        );
        track_subscription(
            &mut subs,
            &MessageOut::Unsubscribe {
                market_id: MarketId::from("m1"),
            },
        );
        assert!(subs.is_empty());
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "no close frame");
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut client = WsClient::new(WsConfig::default());
        client.disconnect().await;
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }
}
