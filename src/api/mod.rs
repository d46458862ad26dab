//! HTTP and WebSocket API module
//!
//! This module contains the provisioning endpoints, the WebSocket session
//! layer and the message formats exchanged with clients.

pub mod handlers;
pub mod protocol;
pub mod responses;
pub mod session;
pub mod socket;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;
use socket::ws_handler;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/createTimer", post(create_timer_handler))
        .route("/timer/:id", get(get_timer_handler))
        .route("/rooms/:room_id", get(room_handler))
        .route("/ws", get(ws_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
