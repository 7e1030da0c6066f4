//! Scheduler error types

use sprintsync_common::error::{ErrorClassification, ErrorSeverity};
use sprintsync_domain::SprintSyncError;
use thiserror::Error;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl ErrorClassification for SchedulerError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyRunning | Self::NotRunning => ErrorSeverity::Warning,
            Self::Timeout { .. } | Self::TaskJoinFailed(_) => ErrorSeverity::Error,
        }
    }
}

impl From<SchedulerError> for SprintSyncError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                Self::Validation(err.to_string())
            }
            SchedulerError::Timeout { seconds } => Self::Timeout(seconds.saturating_mul(1000)),
            SchedulerError::TaskJoinFailed(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
