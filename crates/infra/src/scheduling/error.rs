//! Scheduler error types

use keystay_domain::KeystayError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A worker already exists for the property
    #[error("Property {0} is already registered for sync")]
    AlreadyRegistered(String),

    /// No worker exists for the property
    #[error("Property {0} is not registered for sync")]
    NotRegistered(String),

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let mapped = match err {
            SchedulerError::AlreadyRegistered(_) | SchedulerError::NotRegistered(_) => {
                KeystayError::InvalidInput(err.to_string())
            }
            _ => KeystayError::Internal(err.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<SchedulerError> for KeystayError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
