//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TimerSnapshot;

/// Response to POST /createTimer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimerResponse {
    pub unique_id: String,
}

/// Live state of one room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_id: String,
    pub time: u32,
    pub is_running: bool,
    pub subscribers: usize,
}

impl RoomResponse {
    pub fn new(room_id: String, snapshot: TimerSnapshot, subscribers: usize) -> Self {
        Self {
            room_id,
            time: snapshot.remaining,
            is_running: snapshot.is_running,
            subscribers,
        }
    }
}

/// Server status with room counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub active_rooms: usize,
    pub running_rooms: usize,
    pub stored_timers: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
