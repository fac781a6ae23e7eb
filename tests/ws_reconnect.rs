//! Stream client behavior against a local WebSocket server: resubscribe
//! after reconnect, and terminal offline after exhausting attempts.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use dcex_sdk::shared::MarketId;
use dcex_sdk::ws::{MessageIn, ReadyState, WsClient, WsConfig, WsEvent};

fn fast_config(url: String, max_attempts: u32) -> WsConfig {
    WsConfig {
        url,
        reconnect: true,
        base_reconnect_delay_ms: 10,
        max_reconnect_delay_ms: 50,
        max_reconnect_attempts: max_attempts,
    }
}

async fn wait_for<F>(client: &WsClient, mut pred: F) -> WsEvent
where
    F: FnMut(&WsEvent) -> bool,
{
    let mut events = client.events();
    timeout(Duration::from_secs(10), async {
        loop {
            let event = events.next().await.expect("event stream ended");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn resubscribes_after_server_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(8);

    tokio::spawn(async move {
        // First two connections: handshake, then drop without a close frame.
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(ws);
        }

        // Final connection: forward received frames to the test, answer
        // the subscribe with a snapshot.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = frame_tx.send(text.to_string()).await;
                let snapshot = serde_json::json!({
                    "type": "orderbook_snapshot",
                    "data": {
                        "market_id": "sol-usdc",
                        "bids": [{"price": 100, "size": 5, "order_count": 1}],
                        "asks": [],
                        "last_price": null,
                        "timestamp": "2026-08-26T00:00:00Z"
                    }
                });
                let _ = ws.send(Message::Text(snapshot.to_string().into())).await;
            }
        }
    });

    let mut client = WsClient::new(fast_config(format!("ws://{}", addr), 5));
    client.connect();
    client.subscribe(MarketId::from("sol-usdc")).unwrap();

    // The tracked subscription is replayed on the surviving connection.
    let frame = timeout(Duration::from_secs(10), frame_rx.recv())
        .await
        .expect("no frame from reconnected client")
        .unwrap();
    assert!(frame.contains("\"subscribe\""));
    assert!(frame.contains("sol-usdc"));

    // And the snapshot answer arrives as a parsed message event.
    let event = wait_for(&client, |e| {
        matches!(e, WsEvent::Message(MessageIn::OrderbookSnapshot(_)))
    })
    .await;
    match event {
        WsEvent::Message(MessageIn::OrderbookSnapshot(snap)) => {
            assert_eq!(snap.market_id, MarketId::from("sol-usdc"));
            assert_eq!(snap.bids.len(), 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    client.disconnect().await;
}

#[tokio::test]
async fn goes_offline_after_exhausting_attempts() {
    // Bind then drop, so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = WsClient::new(fast_config(format!("ws://{}", addr), 2));
    client.connect();

    let event = wait_for(&client, |e| matches!(e, WsEvent::Offline)).await;
    assert_eq!(event, WsEvent::Offline);
    assert_eq!(client.ready_state(), ReadyState::Closed);

    client.disconnect().await;
}

#[tokio::test]
async fn connect_again_after_offline_recovers() {
    // Bind then drop, so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = WsClient::new(fast_config(format!("ws://{}", addr), 1));
    client.connect();
    wait_for(&client, |e| matches!(e, WsEvent::Offline)).await;
    // Offline is emitted just before the task returns; let it finish.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The server comes back on the same port; a second connect() must
    // start a fresh connection rather than no-op against the dead task.
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    client.connect();
    wait_for(&client, |e| matches!(e, WsEvent::Connected)).await;
    assert_eq!(client.ready_state(), ReadyState::Open);

    client.disconnect().await;
}

#[tokio::test]
async fn disconnect_during_backoff_stops_retrying() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = WsClient::new(WsConfig {
        url: format!("ws://{}", addr),
        reconnect: true,
        base_reconnect_delay_ms: 300,
        max_reconnect_delay_ms: 400,
        max_reconnect_attempts: 50,
    });
    client.connect();
    wait_for(&client, |e| matches!(e, WsEvent::Error(_))).await;

    // A close requested mid-backoff stops the retry loop; it is not
    // swallowed by the next attempt.
    let start = std::time::Instant::now();
    client.disconnect().await;
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(client.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn clean_disconnect_does_not_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (count_tx, mut count_rx) = mpsc::channel::<()>(8);

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let _ = count_tx.send(()).await;
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        }
    });

    let mut client = WsClient::new(fast_config(format!("ws://{}", addr), 5));
    client.connect();
    wait_for(&client, |e| matches!(e, WsEvent::Connected)).await;
    count_rx.recv().await.unwrap();

    client.disconnect().await;

    // No second connection shows up after a requested close.
    let second = timeout(Duration::from_millis(300), count_rx.recv()).await;
    assert!(second.is_err());
}
