//! Error classification shared by every layer
//!
//! Each crate owns its concrete error enum; this module only supplies the
//! vocabulary used to decide what happens to an error once it is raised:
//! whether a later attempt may succeed, and how loudly it should be logged.
//!
//! ```rust
//! use sprintsync_common::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Offline,
//!     BadPayload,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Offline)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Offline => ErrorSeverity::Warning,
//!             Self::BadPayload => ErrorSeverity::Error,
//!         }
//!     }
//! }
//!
//! assert!(FetchError::Offline.is_retryable());
//! assert!(!FetchError::BadPayload.is_critical());
//! ```

use std::fmt;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, unreachable services, an
    /// overlapping operation that was skipped.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Boom;

    impl ErrorClassification for Boom {
        fn is_retryable(&self) -> bool {
            false
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Critical
        }
    }

    #[test]
    fn severity_ordering_and_display() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn critical_is_derived_from_severity() {
        assert!(Boom.is_critical());
        assert!(!Boom.is_retryable());
    }
}
