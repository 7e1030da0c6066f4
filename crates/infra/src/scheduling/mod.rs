//! Scheduling infrastructure for background reconciliation
//!
//! The reconcile scheduler follows the runtime rules shared by every
//! background task in this crate:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations
//! - Structured tracing

pub mod error;
pub mod reconcile_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reconcile_scheduler::{ReconcileScheduler, ReconcileSchedulerConfig};
