//! WebSocket connection handling

use std::sync::Arc;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{
    protocol::{ClientMessage, ServerMessage},
    session::{Session, SESSION_QUEUE_CAPACITY},
};
use crate::state::AppState;

/// Handle GET /ws - Upgrade to a timer session
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(SESSION_QUEUE_CAPACITY);
    let mut session = Session::new(Arc::clone(&state.registry), tx);
    let session_id = session.id();
    info!("Session {} connected", session_id);

    // Forward queued messages to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode message for session {}: {}", session_id, e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                        Ok(message) => session.handle(message),
                        Err(e) => {
                            warn!("Session {} sent an invalid message: {}", session_id, e);
                            session.send(ServerMessage::error(e.to_string()));
                        }
                    },
                    Some(Ok(Message::Close(_))) => {
                        debug!("Session {} closed by client", session_id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error on session {}: {}", session_id, e);
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut send_task => break,
        }
    }

    session.disconnect();
    send_task.abort();
    info!("Session {} disconnected", session_id);
}
