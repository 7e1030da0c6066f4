//! In-process implementation of [`PersistenceService`]
//!
//! Behaves like the hosted store: every write is stamped with a strictly
//! increasing server time, incremental queries return rows changed after the
//! caller's watermark, and the response carries the server clock as the next
//! watermark. Used by the demo binary and by tests, which can inject failures
//! and latency.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use sprintsync_core::PersistenceService;
use sprintsync_domain::{
    IncrementalScheduleResponse, MemberId, RawTeamMember, RemoteScheduleEntry, RemoteScheduleMap,
    RemoteSprintWindow, RemoteTeam, Result, ScheduleEntry, ScheduleKey, SprintSyncError, TeamId,
    WorkOption,
};
use tracing::debug;

/// One call to `update_schedule_entry`, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub value: WorkOption,
    pub reason: Option<String>,
    pub succeeded: bool,
}

#[derive(Default)]
struct RemoteState {
    entries: BTreeMap<ScheduleKey, RemoteScheduleEntry>,
    members: Vec<RawTeamMember>,
    teams: Vec<RemoteTeam>,
    sprint: Option<RemoteSprintWindow>,
    last_stamp: Option<DateTime<Utc>>,
    writes: Vec<RecordedWrite>,
    failing_writes: usize,
    writes_down: bool,
    reads_down: bool,
    write_delay: Duration,
    ack_delay: Duration,
    read_delay: Duration,
}

impl RemoteState {
    /// Strictly increasing server clock
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn team_of(&self, member_id: MemberId) -> Option<TeamId> {
        self.members
            .iter()
            .find(|m| m.id == member_id)
            .and_then(|m| m.team_id)
    }

    fn select(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<TeamId>,
        since: Option<DateTime<Utc>>,
    ) -> RemoteScheduleMap {
        let mut map = RemoteScheduleMap::new();
        for (key, entry) in &self.entries {
            if key.date < start || key.date > end {
                continue;
            }
            if team_id.is_some() && self.team_of(key.member_id) != team_id {
                continue;
            }
            if let Some(since) = since {
                if !matches!(entry.updated_at.or(entry.created_at), Some(at) if at > since) {
                    continue;
                }
            }
            map.entry(key.member_id)
                .or_default()
                .insert(key.date, entry.clone());
        }
        map
    }

    fn upsert(&mut self, key: ScheduleKey, value: WorkOption, reason: Option<String>) {
        let stamp = self.tick();
        let created_at = self
            .entries
            .get(&key)
            .and_then(|e| e.created_at)
            .unwrap_or(stamp);
        self.entries.insert(
            key,
            RemoteScheduleEntry {
                value,
                reason,
                created_at: Some(created_at),
                updated_at: Some(stamp),
            },
        );
    }
}

/// Shared, cloneable in-memory schedule store
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(self, teams: Vec<RemoteTeam>, members: Vec<RawTeamMember>) -> Self {
        {
            let mut state = self.state.lock();
            state.teams = teams;
            state.members = members;
        }
        self
    }

    pub fn with_sprint(self, sprint: RemoteSprintWindow) -> Self {
        self.state.lock().sprint = Some(sprint);
        self
    }

    /// Write an entry as another client would, bypassing failure injection
    pub fn seed(&self, member_id: MemberId, date: NaiveDate, value: WorkOption) -> DateTime<Utc> {
        let mut state = self.state.lock();
        state.upsert(ScheduleKey::new(member_id, date), value, None);
        state.last_stamp.unwrap_or_else(Utc::now)
    }

    /// Current stored value for one cell
    pub fn entry(&self, member_id: MemberId, date: NaiveDate) -> Option<ScheduleEntry> {
        self.state
            .lock()
            .entries
            .get(&ScheduleKey::new(member_id, date))
            .cloned()
            .map(|remote| remote.into_entry(member_id, date))
    }

    /// Every write attempt in arrival order
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    /// Fail the next `count` writes, then recover
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().failing_writes = count;
    }

    /// Reject every write while `down`
    pub fn set_writes_down(&self, down: bool) {
        self.state.lock().writes_down = down;
    }

    /// Fail every read while `down`
    pub fn set_reads_down(&self, down: bool) {
        self.state.lock().reads_down = down;
    }

    /// Delay each write before it lands
    pub fn set_write_delay(&self, delay: Duration) {
        self.state.lock().write_delay = delay;
    }

    /// Delay the response to a write that has already landed
    pub fn set_ack_delay(&self, delay: Duration) {
        self.state.lock().ack_delay = delay;
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().read_delay = delay;
    }

    async fn read_gate(&self) -> Result<()> {
        let (down, delay) = {
            let state = self.state.lock();
            (state.reads_down, state.read_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if down {
            return Err(SprintSyncError::Sync("schedule service unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for InMemoryPersistence {
    async fn get_schedule_entries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<TeamId>,
    ) -> Result<RemoteScheduleMap> {
        self.read_gate().await?;
        Ok(self.state.lock().select(start, end, team_id, None))
    }

    async fn get_schedule_entries_incremental(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<TeamId>,
        since: Option<DateTime<Utc>>,
    ) -> Result<IncrementalScheduleResponse> {
        self.read_gate().await?;
        let mut state = self.state.lock();
        let data = state.select(start, end, team_id, since);
        let changes_count = data.values().map(BTreeMap::len).sum();
        let sync_timestamp = state.tick();
        Ok(IncrementalScheduleResponse {
            data,
            sync_timestamp,
            changes_count,
        })
    }

    async fn update_schedule_entry(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        value: WorkOption,
        reason: Option<String>,
    ) -> Result<()> {
        let delay = self.state.lock().write_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let ack_delay = {
            let mut state = self.state.lock();
            let failed = if state.writes_down {
                true
            } else if state.failing_writes > 0 {
                state.failing_writes -= 1;
                true
            } else {
                false
            };

            state.writes.push(RecordedWrite {
                member_id,
                date,
                value,
                reason: reason.clone(),
                succeeded: !failed,
            });

            if failed {
                debug!(member_id, %date, "rejecting schedule write");
                return Err(SprintSyncError::TransientWrite(format!(
                    "write for member {member_id} on {date} rejected"
                )));
            }

            state.upsert(ScheduleKey::new(member_id, date), value, reason);
            state.ack_delay
        };
        if !ack_delay.is_zero() {
            tokio::time::sleep(ack_delay).await;
        }
        Ok(())
    }

    async fn get_team_members(&self, team_id: Option<TeamId>) -> Result<Vec<RawTeamMember>> {
        self.read_gate().await?;
        Ok(self
            .state
            .lock()
            .members
            .iter()
            .filter(|m| team_id.is_none() || m.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn get_teams(&self) -> Result<Vec<RemoteTeam>> {
        self.read_gate().await?;
        Ok(self.state.lock().teams.clone())
    }

    async fn get_current_sprint_window(&self) -> Result<RemoteSprintWindow> {
        self.read_gate().await?;
        self.state
            .lock()
            .sprint
            .ok_or_else(|| SprintSyncError::NotFound("no sprint window configured".into()))
    }
}
