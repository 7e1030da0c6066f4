//! # SprintSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Working-day calendar and sprint window validation
//! - Role-based capacity calculations
//! - The schedule state machine behind the optimistic store
//! - Incremental reconciliation against the remote store
//! - Tag-invalidated caching of derived aggregates
//! - Port interfaces (traits) for persistence and session storage
//!
//! ## Architecture Principles
//! - Only depends on `sprintsync-common` and `sprintsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod cache;
pub mod calendar;
pub mod capacity;
pub mod schedule;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use cache::{CacheKey, CachedAggregate, CapacityCache};
pub use calendar::{SprintWeek, SprintWindow};
pub use schedule::ports::{PersistenceService, ScheduleSink};
pub use schedule::{MergeReport, ScheduleSnapshot, ScheduleState};
pub use sync::ports::SessionStore;
pub use sync::{IncrementalSyncReconciler, ReconcileScope, SyncOutcome};
