//! Incremental reconciliation with the remote schedule store

pub mod ports;
mod reconciler;

pub use self::reconciler::{IncrementalSyncReconciler, ReconcileScope, SkipReason, SyncOutcome};
