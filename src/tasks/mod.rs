//! Background tasks module
//!
//! This module contains the per-room countdown task and its supervisor.

pub mod countdown;

// Re-export main functions
pub use countdown::{countdown_task, spawn_countdown, supervise};
