//! Error types for the metric store.

use thiserror::Error;

/// Result type alias for metric store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during metric store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// The record was rejected before touching the database.
    #[error("{0}")]
    Validation(String),
}

impl StoreError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}
