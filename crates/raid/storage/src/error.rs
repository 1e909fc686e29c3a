use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for raid_types::RaidError {
    fn from(err: StorageError) -> Self {
        raid_types::RaidError::StorageFailure(err.to_string())
    }
}
