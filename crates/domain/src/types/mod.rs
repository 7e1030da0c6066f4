//! Domain types and models
//!
//! Split by concern: calendar days, schedule entries and their optimistic
//! overlay, team roster, derived capacity aggregates, remote wire shapes and
//! the small session record that survives restarts.

pub mod calendar;
pub mod capacity;
pub mod remote;
pub mod schedule;
pub mod session;
pub mod team;

pub use calendar::{SprintConfigValidation, WorkingDay};
pub use capacity::{
    CompanyCapacitySummary, MemberCapacitySummary, TeamCapacitySummary, WeeklyHours,
};
pub use remote::{
    IncrementalScheduleResponse, RawTeamMember, RemoteScheduleEntry, RemoteScheduleMap,
    RemoteSprintWindow, RemoteTeam,
};
pub use schedule::{
    EntryState, MemberId, OptimisticEntry, ScheduleCell, ScheduleEntry, ScheduleKey, TeamId,
    WorkOption,
};
pub use session::SessionState;
pub use team::{Role, Team, TeamMember};
