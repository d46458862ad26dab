//! WebSocket message formats
//!
//! Frames are JSON text tagged by `type`, e.g.
//! `{"type":"joinRoom","roomId":"tm-3f9a1c"}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::TimerSnapshot;

/// Longest accepted room identifier, in bytes
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Most rooms a single connection may be joined to at once
pub const MAX_ROOMS_PER_SESSION: usize = 32;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("Cannot join more than {0} rooms per connection")]
    TooManyRooms(usize),
}

/// Commands sent by a connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    LeaveRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    StartTimer {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    ResetTimer {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

impl ClientMessage {
    /// Parse and validate a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: Self = serde_json::from_str(text)?;
        validate_room_id(message.room_id())?;
        Ok(message)
    }

    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id }
            | Self::LeaveRoom { room_id }
            | Self::StartTimer { room_id }
            | Self::ResetTimer { room_id } => room_id,
        }
    }
}

/// Messages pushed to a connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full state, sent once to a connection when it joins a room
    TimerStateUpdate {
        #[serde(rename = "roomId")]
        room_id: String,
        time: u32,
        #[serde(rename = "isRunning")]
        is_running: bool,
    },
    /// Remaining seconds after a tick or reset
    TimerUpdate {
        #[serde(rename = "roomId")]
        room_id: String,
        time: u32,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn state(room_id: &str, snapshot: TimerSnapshot) -> Self {
        Self::TimerStateUpdate {
            room_id: room_id.to_string(),
            time: snapshot.remaining,
            is_running: snapshot.is_running,
        }
    }

    pub fn update(room_id: &str, time: u32) -> Self {
        Self::TimerUpdate {
            room_id: room_id.to_string(),
            time,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

pub fn validate_room_id(room_id: &str) -> Result<(), ProtocolError> {
    if room_id.trim().is_empty() {
        return Err(ProtocolError::InvalidRoomId("room id must not be empty".to_string()));
    }
    if room_id.len() > MAX_ROOM_ID_LEN {
        return Err(ProtocolError::InvalidRoomId(format!(
            "room id longer than {} bytes",
            MAX_ROOM_ID_LEN
        )));
    }
    Ok(())
}
