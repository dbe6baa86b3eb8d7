//! Seating error types.

use super::models::{ParticipantId, TournamentId};
use std::time::Duration;
use thiserror::Error;

/// Seating errors
#[derive(Debug, Error)]
pub enum SeatingError {
    /// Tournament not found
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// Participant not found
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Configuration rejected (e.g. non-positive seats per table)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No table could be created for an overflow seat
    #[error("No capacity left to seat a player in tournament {0}")]
    NoCapacity(TournamentId),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Save rejected by the storage layer
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Storage call exceeded the operation timeout
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SeatingError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Storage failures leave the aggregate untouched, so they are safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SeatingError::Database(_) | SeatingError::Persistence(_) | SeatingError::Timeout(_)
        )
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            SeatingError::Database(_) | SeatingError::Persistence(_) => {
                "Seating could not be saved, please retry".to_string()
            }
            SeatingError::Timeout(_) => "Seating service is busy, please retry".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for seating operations
pub type SeatingResult<T> = Result<T, SeatingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_retryable() {
        assert!(SeatingError::Persistence("disk full".to_string()).is_retryable());
        assert!(SeatingError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!SeatingError::TournamentNotFound(7).is_retryable());
        assert!(!SeatingError::InvalidConfiguration("seats".to_string()).is_retryable());
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err = SeatingError::Persistence("relation \"tables\" does not exist".to_string());
        assert!(!err.client_message().contains("relation"));
        assert_eq!(
            SeatingError::ParticipantNotFound(42).client_message(),
            "Participant not found: 42"
        );
    }
}
