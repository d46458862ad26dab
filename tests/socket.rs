use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use room_timer::{
    api::create_router,
    services::MemoryRecordStore,
    state::{AppState, RoomRegistry},
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TICK: Duration = Duration::from_millis(20);

async fn spawn_server() -> (SocketAddr, Arc<AppState>) {
    let registry = Arc::new(RoomRegistry::with_tick_period(TICK));
    let state = Arc::new(AppState::with_registry(
        0,
        "127.0.0.1".to_string(),
        Arc::new(MemoryRecordStore::new()),
        registry,
    ));
    let app = create_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

async fn send(client: &mut Client, message: Value) {
    client.send(Message::Text(message.to_string())).await.unwrap();
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_countdown_over_websocket() {
    let (addr, _state) = spawn_server().await;
    let mut client = connect(addr).await;

    send(&mut client, json!({ "type": "joinRoom", "roomId": "tm-e2e" })).await;
    assert_eq!(
        next_json(&mut client).await,
        json!({ "type": "timerStateUpdate", "roomId": "tm-e2e", "time": 15, "isRunning": false })
    );

    send(&mut client, json!({ "type": "startTimer", "roomId": "tm-e2e" })).await;
    send(&mut client, json!({ "type": "startTimer", "roomId": "tm-e2e" })).await;
    for expected in (0..15).rev() {
        assert_eq!(
            next_json(&mut client).await,
            json!({ "type": "timerUpdate", "roomId": "tm-e2e", "time": expected })
        );
    }

    send(&mut client, json!({ "type": "resetTimer", "roomId": "tm-e2e" })).await;
    assert_eq!(
        next_json(&mut client).await,
        json!({ "type": "timerUpdate", "roomId": "tm-e2e", "time": 15 })
    );
}

#[tokio::test]
async fn test_invalid_message_reports_error_and_keeps_connection() {
    let (addr, _state) = spawn_server().await;
    let mut client = connect(addr).await;

    client.send(Message::Text("not json".to_string())).await.unwrap();
    let error = next_json(&mut client).await;
    assert_eq!(error["type"], "error");

    send(&mut client, json!({ "type": "joinRoom", "roomId": "room1" })).await;
    assert_eq!(next_json(&mut client).await["type"], "timerStateUpdate");
}

#[tokio::test]
async fn test_disconnect_releases_only_its_rooms() {
    let (addr, state) = spawn_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "type": "joinRoom", "roomId": "shared" })).await;
    next_json(&mut alice).await;
    send(&mut alice, json!({ "type": "joinRoom", "roomId": "alice-only" })).await;
    next_json(&mut alice).await;
    send(&mut bob, json!({ "type": "joinRoom", "roomId": "shared" })).await;
    next_json(&mut bob).await;

    send(&mut bob, json!({ "type": "startTimer", "roomId": "shared" })).await;
    assert_eq!(next_json(&mut bob).await["time"], 14);

    alice.close(None).await.unwrap();
    wait_for(|| state.registry.snapshot("alice-only").is_none()).await;

    assert_eq!(state.registry.subscribers("shared"), 1);
    let next = next_json(&mut bob).await;
    assert_eq!(next["type"], "timerUpdate");
    assert!(next["time"].as_u64().unwrap() < 14);
}
