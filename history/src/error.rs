//! Error types for the history store and its persistence adapters.

use thiserror::Error;

/// Failures reported by a [`Storage`](crate::core::storage::Storage) adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The medium refused the write because it is full (browser quota, file quota).
    /// `limit` is `None` when the medium does not disclose its quota.
    #[error("Storage capacity exceeded writing `{key}` ({attempted} bytes, {})", describe_limit(.limit))]
    CapacityExceeded {
        key: String,
        attempted: usize,
        limit: Option<usize>,
    },

    /// Any other write failure.
    #[error("Write failed for `{key}`: {reason}")]
    WriteFailure { key: String, reason: String },

    /// The medium could not be read at all (as opposed to the key being absent).
    #[error("Read failed for `{key}`: {reason}")]
    ReadFailure { key: String, reason: String },
}

fn describe_limit(limit: &Option<usize>) -> String {
    match limit {
        Some(bytes) => format!("limit {bytes}"),
        None => "limit unknown".to_string(),
    }
}

impl StorageError {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, StorageError::CapacityExceeded { .. })
    }
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persistence adapter failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// History document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected store configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Export artifact could not be imported
    #[error("Import failed: {0}")]
    Import(String),

    /// Export artifact could not be delivered
    #[error("Export delivery failed: {0}")]
    Delivery(String),
}
