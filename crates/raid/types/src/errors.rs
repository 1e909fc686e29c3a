//! Error taxonomy for raid coordination

use crate::RaidId;

/// Errors returned by raid operations.
///
/// Everything except `StorageFailure` is an expected outcome to be shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RaidError {
    #[error("Raid not found: {0}")]
    RaidNotFound(RaidId),

    #[error("Raid closed: {0}")]
    RaidClosed(RaidId),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl RaidError {
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, RaidError::StorageFailure(_))
    }
}

/// Result type alias for raid operations
pub type RaidResult<T> = Result<T, RaidError>;
