//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use sprintsync_common::error::{ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Main error type for SprintSync
///
/// Pure calculations (calendar, capacity) return `Validation` directly to the
/// caller. Store and reconciler failures are converted into state or logs
/// before they reach the presentation layer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SprintSyncError {
    /// Invalid sprint configuration or a work option the member's role forbids
    #[error("Validation error: {0}")]
    Validation(String),

    /// A schedule commit was rejected or could not reach the remote store
    #[error("Schedule write failed: {0}")]
    TransientWrite(String),

    /// An incremental reconciliation cycle failed
    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SprintSyncError {
    /// Stable label suitable for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::TransientWrite(_) => "transient_write",
            Self::Sync(_) => "sync",
            Self::Persistence(_) => "persistence",
            Self::Timeout(_) => "timeout",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for SprintSync operations
pub type Result<T> = std::result::Result<T, SprintSyncError>;

impl ErrorClassification for SprintSyncError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientWrite(_) | Self::Sync(_) | Self::Timeout(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(_)
            | Self::NotFound(_)
            | Self::TransientWrite(_)
            | Self::Sync(_)
            | Self::Timeout(_) => ErrorSeverity::Warning,
            Self::Persistence(_) | Self::Config(_) => ErrorSeverity::Error,
            Self::Internal(_) => ErrorSeverity::Critical,
        }
    }
}
