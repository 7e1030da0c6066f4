//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use sprintsync_core::capacity::compute_team_summary;
use sprintsync_core::CapacityCache;
use sprintsync_domain::{
    CacheSettings, MemberId, RawTeamMember, RemoteSprintWindow, RemoteTeam, Team, TeamId,
};
use sprintsync_infra::{InMemoryPersistence, ScheduleStore, ScheduleStoreHandle, StoreSettings};
use tokio::task::JoinHandle;

pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Day of January 2024. The 14th is a Sunday; sprints start there.
pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid January date")
}

pub fn raw_member(id: MemberId, team_id: TeamId, is_manager: bool) -> RawTeamMember {
    RawTeamMember {
        id,
        name: format!("member-{id}"),
        team_id: Some(team_id),
        is_manager: Some(is_manager),
        ..RawTeamMember::default()
    }
}

/// Two teams: 5 = {1 regular, 2 manager}, 6 = {3 regular}
pub fn roster_persistence() -> InMemoryPersistence {
    InMemoryPersistence::new()
        .with_roster(
            vec![
                RemoteTeam { id: 5, name: "Platform".into(), sprint_length_weeks: Some(2) },
                RemoteTeam { id: 6, name: "Payments".into(), sprint_length_weeks: Some(2) },
            ],
            vec![raw_member(1, 5, false), raw_member(2, 5, true), raw_member(3, 6, false)],
        )
        .with_sprint(RemoteSprintWindow {
            start: jan(14),
            end: jan(25),
            length_weeks: 2,
            sprint_number: 1,
        })
}

pub fn roster_map() -> HashMap<MemberId, TeamId> {
    HashMap::from([(1, 5), (2, 5), (3, 6)])
}

/// Prime the cache with an empty summary for `team_id`
pub fn prime_team(cache: &CapacityCache, team_id: TeamId) {
    let team = Team { id: team_id, name: format!("team-{team_id}") };
    cache
        .team_summary(team_id, || Ok(compute_team_summary(&team, &[], &BTreeMap::new(), &[])))
        .expect("empty summary computes");
}

/// A running store over `persistence`
pub struct StoreHarness {
    pub persistence: InMemoryPersistence,
    pub cache: Arc<CapacityCache>,
    pub handle: ScheduleStoreHandle,
    pub task: JoinHandle<()>,
}

impl StoreHarness {
    pub fn start(persistence: InMemoryPersistence) -> Self {
        Self::with_settings(persistence, StoreSettings { debounce: DEBOUNCE, ..StoreSettings::default() })
    }

    pub fn with_settings(persistence: InMemoryPersistence, settings: StoreSettings) -> Self {
        let cache = Arc::new(CapacityCache::new(CacheSettings::default()));
        let (handle, task) =
            ScheduleStore::spawn(Arc::new(persistence.clone()), Arc::clone(&cache), settings);
        Self { persistence, cache, handle, task }
    }
}
