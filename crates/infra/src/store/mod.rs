//! Optimistic schedule store
//!
//! A single coordinator task owns the [`ScheduleState`] and is the only
//! writer. Mutations reach it as messages through a [`ScheduleStoreHandle`];
//! readers get immutable snapshots over a watch channel.
//!
//! [`ScheduleState`]: sprintsync_core::ScheduleState

mod coordinator;
mod handle;

pub use coordinator::{ScheduleStore, StoreSettings};
pub use handle::ScheduleStoreHandle;
