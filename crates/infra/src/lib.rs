//! # SprintSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The schedule store coordinator task (single writer over the optimistic
//!   state) and its cloneable handle
//! - The background reconcile scheduler
//! - Configuration loading from env vars and files
//! - The JSON session store and an in-memory persistence adapter
//!
//! ## Architecture
//! - Implements traits defined in `sprintsync-core`
//! - Contains all "impure" code (tasks, timers, file I/O)

pub mod config;
pub mod persistence;
pub mod scheduling;
pub mod session;
pub mod store;

// Re-export commonly used items
pub use persistence::InMemoryPersistence;
pub use scheduling::{ReconcileScheduler, ReconcileSchedulerConfig, SchedulerError};
pub use session::FileSessionStore;
pub use store::{ScheduleStore, ScheduleStoreHandle, StoreSettings};
