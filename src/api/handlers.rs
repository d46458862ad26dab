//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::{services::RecordStore, state::AppState};
use super::responses::{CreateTimerResponse, HealthResponse, RoomResponse, StatusResponse};

/// Handle POST /createTimer - Provision a timer record with a fresh id
pub async fn create_timer_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.create_timer().await {
        Ok(record) => Json(CreateTimerResponse {
            unique_id: record.unique_id,
        })
        .into_response(),
        Err(e) => {
            error!("Error saving timer: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error creating timer").into_response()
        }
    }
}

/// Handle GET /timer/:id - Look up a timer record
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.store.find_by_unique_id(&id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => {
            info!("Timer {} not found", id);
            (StatusCode::NOT_FOUND, "Timer not found").into_response()
        }
        Err(e) => {
            error!("Failed to look up timer {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handle GET /rooms/:room_id - Live countdown state of a room
pub async fn room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, StatusCode> {
    let snapshot = state.registry.snapshot(&room_id).ok_or(StatusCode::NOT_FOUND)?;
    let subscribers = state.registry.subscribers(&room_id);
    Ok(Json(RoomResponse::new(room_id, snapshot, subscribers)))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let stored_timers = match state.store.count().await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count timer records: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        active_rooms: state.registry.room_count(),
        running_rooms: state.registry.running_count(),
        stored_timers,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::create_router,
        error::PersistenceError,
        services::{MemoryRecordStore, TimerRecord},
    };
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn create(&self, _unique_id: &str) -> Result<TimerRecord, PersistenceError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn find_by_unique_id(&self, _unique_id: &str) -> Result<Option<TimerRecord>, PersistenceError> {
            Err(std::io::Error::other("disk gone").into())
        }

        async fn count(&self) -> Result<usize, PersistenceError> {
            Ok(0)
        }
    }

    fn app_with(store: Arc<dyn RecordStore>) -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(3000, "127.0.0.1".to_string(), store));
        (create_router(Arc::clone(&state)), state)
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_create_then_fetch_timer() {
        let (app, _) = app_with(Arc::new(MemoryRecordStore::new()));

        let (status, body) = send(&app, "POST", "/createTimer").await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_slice(&body).unwrap();
        let id = created["uniqueId"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", &format!("/timer/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(record, json!({ "uniqueId": id, "time": 15, "isRunning": false }));
    }

    #[tokio::test]
    async fn test_missing_timer_is_404() {
        let (app, _) = app_with(Arc::new(MemoryRecordStore::new()));

        let (status, body) = send(&app, "GET", "/timer/tm-nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Timer not found");
    }

    #[tokio::test]
    async fn test_store_failures_are_500() {
        let (app, _) = app_with(Arc::new(BrokenStore));

        let (status, body) = send(&app, "POST", "/createTimer").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Error creating timer");

        let (status, _) = send(&app, "GET", "/timer/tm-abc").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_room_lookup_does_not_create() {
        let (app, state) = app_with(Arc::new(MemoryRecordStore::new()));

        let (status, _) = send(&app, "GET", "/rooms/room1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.registry.room_count(), 0);

        let (_snapshot, _rx) = state.registry.join("room1");
        let (status, body) = send(&app, "GET", "/rooms/room1").await;
        assert_eq!(status, StatusCode::OK);
        let room: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            room,
            json!({ "roomId": "room1", "time": 15, "isRunning": false, "subscribers": 1 })
        );
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let (app, state) = app_with(Arc::new(MemoryRecordStore::new()));
        let (_snapshot, _updates) = state.registry.join("room1");
        state.registry.reset("unwatched");

        let (status, body) = send(&app, "GET", "/status").await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["activeRooms"], 1);
        assert_eq!(report["runningRooms"], 0);
        assert_eq!(report["storedTimers"], 0);

        let (status, body) = send(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "ok");
    }
}
