//! Wire shapes exchanged with the persistence service

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::{MemberId, ScheduleEntry, TeamId, WorkOption};

/// Schedule value as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteScheduleEntry {
    pub value: WorkOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteScheduleEntry {
    pub fn into_entry(self, member_id: MemberId, date: NaiveDate) -> ScheduleEntry {
        ScheduleEntry {
            member_id,
            date,
            value: self.value,
            reason: self.reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_weekend: false,
        }
    }
}

/// member -> date -> entry, as returned by the range queries
pub type RemoteScheduleMap = BTreeMap<MemberId, BTreeMap<NaiveDate, RemoteScheduleEntry>>;

/// Flatten a nested remote map into entries ordered by (member, date).
pub fn flatten_remote(map: RemoteScheduleMap) -> Vec<ScheduleEntry> {
    map.into_iter()
        .flat_map(|(member_id, days)| {
            days.into_iter().map(move |(date, remote)| remote.into_entry(member_id, date))
        })
        .collect()
}

/// Response of an incremental range query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalScheduleResponse {
    pub data: RemoteScheduleMap,
    /// Server clock at the moment the delta was computed; becomes the next
    /// watermark
    pub sync_timestamp: DateTime<Utc>,
    pub changes_count: usize,
}

/// Sprint window as published by the remote store (unvalidated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSprintWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length_weeks: u32,
    pub sprint_number: u32,
}

/// Member record as delivered by the remote store.
///
/// Role information arrives through several optional fields; it is folded
/// into a single [`super::team::Role`] on ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTeamMember {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub is_manager: Option<bool>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTeam {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub sprint_length_weeks: Option<u32>,
}
