//! External collaborator module
//!
//! This module contains the timer record store and id generation used at
//! provisioning time. Neither sits on the countdown path.

pub mod ids;
pub mod record_store;

// Re-export main types
pub use ids::{generate_unique_id, ID_PREFIX};
pub use record_store::{JsonFileRecordStore, MemoryRecordStore, RecordStore, TimerRecord};
