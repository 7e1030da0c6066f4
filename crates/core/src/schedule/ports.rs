//! Port interfaces for schedule persistence
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sprintsync_domain::{
    IncrementalScheduleResponse, MemberId, RawTeamMember, RemoteScheduleMap, RemoteSprintWindow,
    RemoteTeam, Result, ScheduleEntry, TeamId, WorkOption,
};

use super::MergeReport;

/// The remote schedule store
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// All entries in `[start, end]`, optionally limited to one team
    async fn get_schedule_entries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<TeamId>,
    ) -> Result<RemoteScheduleMap>;

    /// Entries in `[start, end]` changed after `since` (everything when `None`)
    async fn get_schedule_entries_incremental(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<TeamId>,
        since: Option<DateTime<Utc>>,
    ) -> Result<IncrementalScheduleResponse>;

    /// Upsert one schedule cell
    async fn update_schedule_entry(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        value: WorkOption,
        reason: Option<String>,
    ) -> Result<()>;

    async fn get_team_members(&self, team_id: Option<TeamId>) -> Result<Vec<RawTeamMember>>;

    async fn get_teams(&self) -> Result<Vec<RemoteTeam>>;

    async fn get_current_sprint_window(&self) -> Result<RemoteSprintWindow>;
}

/// Writer side of the schedule store as seen by the reconciler
#[async_trait]
pub trait ScheduleSink: Send + Sync {
    /// Merge remote entries last-write-wins without touching shadowed keys
    async fn apply_remote(&self, entries: Vec<ScheduleEntry>) -> Result<MergeReport>;

    /// Replace the authoritative layer wholesale
    async fn replace_authoritative(&self, entries: Vec<ScheduleEntry>) -> Result<MergeReport>;
}
