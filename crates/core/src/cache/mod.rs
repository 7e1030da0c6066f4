//! Tag-invalidated cache for derived capacity aggregates
//!
//! Team summaries carry the tags `team:<id>` and `sprint`; the company
//! roll-up carries `company` and `sprint`; the sprint window carries
//! `sprint`. A schedule change for a member of team 5 therefore invalidates
//! `team:5` and `company` and leaves every other team's entry alone.

use std::collections::BTreeSet;

use sprintsync_common::cache::{CacheConfig, CacheLookup, CacheOutcome, CacheStats, TaggedCache};
use sprintsync_common::time::{Clock, SystemClock};
use sprintsync_domain::constants::{TAG_COMPANY, TAG_SPRINT, TAG_TEAM_PREFIX};
use sprintsync_domain::{CacheSettings, CompanyCapacitySummary, Result, TeamCapacitySummary, TeamId};
use tracing::debug;

use crate::calendar::SprintWindow;

/// Cache tag for one team's aggregates
pub fn team_tag(team_id: TeamId) -> String {
    format!("{TAG_TEAM_PREFIX}{team_id}")
}

/// One cached aggregate slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The current sprint window, tagged `sprint`
    SprintWindow,
    /// One team's summary, tagged `team:<id>` and `sprint`
    TeamSummary(TeamId),
    /// The company roll-up, tagged `company` and `sprint`
    CompanySummary,
}

/// Value stored under a [`CacheKey`]
#[derive(Debug, Clone, PartialEq)]
pub enum CachedAggregate {
    Sprint(SprintWindow),
    Team(TeamCapacitySummary),
    Company(CompanyCapacitySummary),
}

/// Derived-aggregate cache with per-kind TTLs
pub struct CapacityCache<C: Clock + Clone = SystemClock> {
    inner: TaggedCache<CacheKey, CachedAggregate, C>,
    settings: CacheSettings,
}

impl CapacityCache<SystemClock> {
    /// Cache on the system clock
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock + Clone> CapacityCache<C> {
    pub fn with_clock(settings: CacheSettings, clock: C) -> Self {
        let config = CacheConfig::builder()
            .max_entries(settings.max_entries.max(1))
            .track_metrics(true)
            .build();
        Self { inner: TaggedCache::with_clock(config, clock), settings }
    }

    /// Cached sprint window, or the result of `load`
    pub fn sprint_window<F>(&self, load: F) -> Result<(SprintWindow, CacheOutcome)>
    where
        F: FnOnce() -> Result<SprintWindow>,
    {
        if let CacheLookup::Hit(CachedAggregate::Sprint(window)) = self.inner.lookup(&CacheKey::SprintWindow) {
            return Ok((window, CacheOutcome::Hit));
        }
        let window = load()?;
        self.inner.insert_tagged(
            CacheKey::SprintWindow,
            CachedAggregate::Sprint(window),
            Some(self.settings.sprint_ttl()),
            [TAG_SPRINT],
        );
        Ok((window, CacheOutcome::Miss))
    }

    /// Fresh cached sprint window, if any
    pub fn cached_sprint_window(&self) -> Option<SprintWindow> {
        match self.inner.lookup(&CacheKey::SprintWindow) {
            CacheLookup::Hit(CachedAggregate::Sprint(window)) => Some(window),
            _ => None,
        }
    }

    /// Store a sprint window fetched elsewhere
    pub fn put_sprint_window(&self, window: SprintWindow) {
        self.inner.insert_tagged(
            CacheKey::SprintWindow,
            CachedAggregate::Sprint(window),
            Some(self.settings.sprint_ttl()),
            [TAG_SPRINT],
        );
    }

    /// Cached summary for `team_id`, or the result of `compute`
    pub fn team_summary<F>(&self, team_id: TeamId, compute: F) -> Result<(TeamCapacitySummary, CacheOutcome)>
    where
        F: FnOnce() -> Result<TeamCapacitySummary>,
    {
        let key = CacheKey::TeamSummary(team_id);
        if let CacheLookup::Hit(CachedAggregate::Team(summary)) = self.inner.lookup(&key) {
            return Ok((summary, CacheOutcome::Hit));
        }
        let summary = compute()?;
        self.inner.insert_tagged(
            key,
            CachedAggregate::Team(summary.clone()),
            Some(self.settings.team_ttl()),
            [team_tag(team_id), TAG_SPRINT.to_string()],
        );
        Ok((summary, CacheOutcome::Miss))
    }

    /// Cached company roll-up, or the result of `compute`
    pub fn company_summary<F>(&self, compute: F) -> Result<(CompanyCapacitySummary, CacheOutcome)>
    where
        F: FnOnce() -> Result<CompanyCapacitySummary>,
    {
        if let CacheLookup::Hit(CachedAggregate::Company(summary)) = self.inner.lookup(&CacheKey::CompanySummary) {
            return Ok((summary, CacheOutcome::Hit));
        }
        let summary = compute()?;
        self.inner.insert_tagged(
            CacheKey::CompanySummary,
            CachedAggregate::Company(summary.clone()),
            Some(self.settings.company_ttl()),
            [TAG_COMPANY, TAG_SPRINT],
        );
        Ok((summary, CacheOutcome::Miss))
    }

    /// `true` while `key` holds an unexpired value
    pub fn is_cache_valid(&self, key: &CacheKey) -> bool {
        self.inner.is_valid(key)
    }

    /// Drop every entry tagged `tag`; returns how many were removed
    pub fn invalidate(&self, tag: &str) -> usize {
        self.inner.invalidate_tag(tag)
    }

    /// Invalidate the given teams and the company roll-up
    pub fn invalidate_teams<I>(&self, team_ids: I) -> usize
    where
        I: IntoIterator<Item = TeamId>,
    {
        let teams: BTreeSet<TeamId> = team_ids.into_iter().collect();
        if teams.is_empty() {
            return 0;
        }
        let mut removed = teams.iter().map(|team_id| self.invalidate(&team_tag(*team_id))).sum::<usize>();
        removed += self.invalidate(TAG_COMPANY);
        debug!(teams = ?teams, removed, "capacity cache invalidated for schedule change");
        removed
    }

    /// Drop every cached aggregate
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Hit, miss and invalidation counters
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use sprintsync_common::time::MockClock;

    use super::*;

    fn summary(team_id: TeamId, utilization: u32) -> TeamCapacitySummary {
        TeamCapacitySummary {
            team_id,
            team_name: format!("team-{team_id}"),
            member_count: 1,
            manager_count: 0,
            max_capacity_hours: 70.0,
            actual_hours: 70.0,
            utilization_percentage: utilization,
            filled_entries: 10,
            total_possible_entries: 10,
            completion_percentage: 100,
            members: Vec::new(),
        }
    }

    fn cache(clock: &MockClock) -> CapacityCache<MockClock> {
        CapacityCache::with_clock(CacheSettings::default(), clock.clone())
    }

    #[test]
    fn second_read_is_a_hit() {
        let cache = cache(&MockClock::new());

        let (_, first) = cache.team_summary(5, || Ok(summary(5, 80))).unwrap();
        let (value, second) = cache.team_summary(5, || Ok(summary(5, 10))).unwrap();

        assert_eq!(first, CacheOutcome::Miss);
        assert_eq!(second, CacheOutcome::Hit);
        assert_eq!(value.utilization_percentage, 80);
    }

    #[test]
    fn team_invalidation_leaves_other_teams() {
        let cache = cache(&MockClock::new());
        cache.team_summary(5, || Ok(summary(5, 80))).unwrap();
        cache.team_summary(6, || Ok(summary(6, 60))).unwrap();

        assert_eq!(cache.invalidate(&team_tag(5)), 1);

        assert!(!cache.is_cache_valid(&CacheKey::TeamSummary(5)));
        assert!(cache.is_cache_valid(&CacheKey::TeamSummary(6)));
    }

    #[test]
    fn schedule_change_drops_team_and_company() {
        let cache = cache(&MockClock::new());
        cache.team_summary(5, || Ok(summary(5, 80))).unwrap();
        cache.team_summary(6, || Ok(summary(6, 60))).unwrap();
        cache
            .company_summary(|| Ok(sprintsync_domain::CompanyCapacitySummary {
                team_count: 2,
                member_count: 2,
                max_capacity_hours: 140.0,
                actual_hours: 98.0,
                utilization_percentage: 70,
                completion_percentage: 100,
                teams: Vec::new(),
            }))
            .unwrap();

        assert_eq!(cache.invalidate_teams([5]), 2);
        assert!(!cache.is_cache_valid(&CacheKey::CompanySummary));
        assert!(cache.is_cache_valid(&CacheKey::TeamSummary(6)));
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn ttl_expiry_forces_recompute() {
        let clock = MockClock::new();
        let cache = cache(&clock);
        cache.team_summary(5, || Ok(summary(5, 80))).unwrap();

        clock.advance(CacheSettings::default().team_ttl() + Duration::from_secs(1));

        let (value, outcome) = cache.team_summary(5, || Ok(summary(5, 55))).unwrap();
        assert_eq!(outcome, CacheOutcome::Miss);
        assert_eq!(value.utilization_percentage, 55);
    }

    #[test]
    fn sprint_tag_clears_everything_derived() {
        let cache = cache(&MockClock::new());
        let start = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        cache.sprint_window(|| SprintWindow::new(start, 2, 1)).unwrap();
        cache.team_summary(5, || Ok(summary(5, 80))).unwrap();
        assert_eq!(cache.cached_sprint_window().map(|w| w.start()), Some(start));

        assert_eq!(cache.invalidate(TAG_SPRINT), 2);
        assert!(!cache.is_cache_valid(&CacheKey::SprintWindow));
        assert!(cache.cached_sprint_window().is_none());
    }

    #[test]
    fn compute_errors_are_not_cached() {
        let cache = cache(&MockClock::new());
        let err = cache
            .team_summary(5, || Err(sprintsync_domain::SprintSyncError::NotFound("team 5".into())))
            .unwrap_err();
        assert!(matches!(err, sprintsync_domain::SprintSyncError::NotFound(_)));
        assert!(!cache.is_cache_valid(&CacheKey::TeamSummary(5)));
    }
}
