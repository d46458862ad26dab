//! Per-connection room membership

use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{ClientMessage, ProtocolError, ServerMessage, MAX_ROOMS_PER_SESSION};
use crate::state::RoomRegistry;

/// Messages a connection may have queued before its forwarders wait
pub const SESSION_QUEUE_CAPACITY: usize = 64;

/// Outbound queue of a single connection
pub type SessionSender = mpsc::Sender<ServerMessage>;

/// One connected client and the rooms it has joined.
///
/// Each joined room has a forwarding task copying the room's broadcasts into
/// the connection's outbound queue. The queue is bounded: a forwarder waits
/// for space, so a slow client falls behind on the room's broadcast channel
/// and skips stale updates there. Leaving a room, or dropping the session,
/// stops the task and releases the room's subscriber count.
pub struct Session {
    id: Uuid,
    registry: Arc<RoomRegistry>,
    outbound: SessionSender,
    memberships: HashMap<String, JoinHandle<()>>,
}

impl Session {
    pub fn new(registry: Arc<RoomRegistry>, outbound: SessionSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            registry,
            outbound,
            memberships: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.memberships.keys().map(String::as_str)
    }

    /// Apply one client command
    pub fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom { room_id } => self.join(room_id),
            ClientMessage::LeaveRoom { room_id } => self.leave(&room_id),
            ClientMessage::StartTimer { room_id } => {
                let outcome = self.registry.start(&room_id);
                debug!("Session {} started room {}: {:?}", self.id, room_id, outcome);
            }
            ClientMessage::ResetTimer { room_id } => {
                debug!("Session {} reset room {}", self.id, room_id);
                self.registry.reset(&room_id);
            }
        }
    }

    /// Queue a message for this connection only, dropping it if the queue is full
    pub fn send(&self, message: ServerMessage) {
        match self.outbound.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Outbound queue of session {} is full, dropping message", self.id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn join(&mut self, room_id: String) {
        if self.memberships.contains_key(&room_id) {
            let snapshot = self.registry.get_or_create(&room_id).snapshot();
            self.send(ServerMessage::state(&room_id, snapshot));
            return;
        }
        if self.memberships.len() >= MAX_ROOMS_PER_SESSION {
            warn!("Session {} refused room {}: membership limit reached", self.id, room_id);
            let error = ProtocolError::TooManyRooms(MAX_ROOMS_PER_SESSION);
            self.send(ServerMessage::error(error.to_string()));
            return;
        }

        let (snapshot, updates) = self.registry.join(&room_id);
        self.send(ServerMessage::state(&room_id, snapshot));

        let forwarder = tokio::spawn(forward_updates(
            room_id.clone(),
            updates,
            self.outbound.clone(),
        ));
        info!("Session {} joined room {}", self.id, room_id);
        self.memberships.insert(room_id, forwarder);
    }

    fn leave(&mut self, room_id: &str) {
        if let Some(forwarder) = self.memberships.remove(room_id) {
            forwarder.abort();
            self.registry.leave(room_id);
            info!("Session {} left room {}", self.id, room_id);
        }
    }

    /// Leave every joined room
    pub fn disconnect(&mut self) {
        let rooms: Vec<String> = self.memberships.keys().cloned().collect();
        if !rooms.is_empty() {
            debug!("Session {} leaving {} room(s)", self.id, rooms.len());
        }
        for room_id in rooms {
            self.leave(&room_id);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn forward_updates(
    room_id: String,
    mut updates: broadcast::Receiver<u32>,
    outbound: SessionSender,
) {
    loop {
        match updates.recv().await {
            Ok(time) => {
                if outbound.send(ServerMessage::update(&room_id, time)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Subscriber of room {} lagged, skipped {} update(s)", room_id, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
