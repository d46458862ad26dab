//! Error types shared across the crate

use thiserror::Error;

/// Failure of the timer record store.
///
/// Lookup misses are not errors; `find_by_unique_id` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("timer '{0}' already exists")]
    DuplicateId(String),

    #[error("failed to access timer store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode timer store: {0}")]
    Encoding(#[from] serde_json::Error),
}
