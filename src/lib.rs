//! Room Timer - shared, server-authoritative countdowns over WebSockets
//!
//! Clients provision a timer record over HTTP, join a room over a WebSocket
//! and receive every tick of the room's countdown. Any participant can start
//! or reset the shared timer.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::PersistenceError;
pub use state::{AppState, RoomRegistry};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
