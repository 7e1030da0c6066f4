//! Schedule state behind the optimistic update store
//!
//! [`ScheduleState`] is the single-writer model: an authoritative layer fed
//! by the remote store and an optimistic overlay of local edits. The async
//! coordinator that owns it lives in the infrastructure crate; everything
//! here is synchronous and deterministic.

pub mod debounce;
pub mod ports;
mod state;

pub use self::debounce::{should_flush, DebounceQueue};
pub use self::state::{MergeReport, ScheduleSnapshot, ScheduleState};
