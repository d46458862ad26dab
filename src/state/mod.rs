//! State management module
//!
//! This module contains the per-room countdown engine and the shared
//! application state handed to HTTP and WebSocket handlers.

pub mod app_state;
pub mod broadcast;
pub mod room_registry;
pub mod room_timer;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use broadcast::RoomChannel;
pub use room_registry::{RoomRegistry, TICK_PERIOD};
pub use room_timer::{IdleHook, RoomTimer, StartOutcome};
pub use timer_state::{TickHandle, TickOutcome, TimerSnapshot, INITIAL_SECONDS};
