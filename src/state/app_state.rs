//! Main application state management

use std::{sync::Arc, time::Instant};
use tracing::{info, warn};

use super::RoomRegistry;
use crate::{
    error::PersistenceError,
    services::{generate_unique_id, RecordStore, TimerRecord},
};

/// Attempts at finding an unused timer id before giving up
const CREATE_ATTEMPTS: usize = 5;

/// Shared state handed to every HTTP and WebSocket handler
pub struct AppState {
    /// Live countdowns keyed by room id
    pub registry: Arc<RoomRegistry>,
    /// Provisioned timer records
    pub store: Arc<dyn RecordStore>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create a new AppState with an empty room registry
    pub fn new(port: u16, host: String, store: Arc<dyn RecordStore>) -> Self {
        Self::with_registry(port, host, store, Arc::new(RoomRegistry::new()))
    }

    pub fn with_registry(
        port: u16,
        host: String,
        store: Arc<dyn RecordStore>,
        registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            registry,
            store,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Provision a new timer record under a freshly generated id
    pub async fn create_timer(&self) -> Result<TimerRecord, PersistenceError> {
        let mut attempt = 1;
        loop {
            let unique_id = generate_unique_id();
            match self.store.create(&unique_id).await {
                Ok(record) => {
                    info!("Created timer {}", record.unique_id);
                    return Ok(record);
                }
                Err(PersistenceError::DuplicateId(id)) if attempt < CREATE_ATTEMPTS => {
                    warn!("Generated timer id {} already taken, retrying", id);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
