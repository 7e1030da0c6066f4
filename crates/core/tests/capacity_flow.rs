//! End-to-end checks across calendar, capacity and the aggregate cache.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use sprintsync_common::cache::CacheOutcome;
use sprintsync_core::cache::team_tag;
use sprintsync_core::calendar::{calculate_sprint_end_date, get_working_days};
use sprintsync_core::capacity::{
    auto_generate_weekend_entries, compute_member_summary, compute_team_summary, is_valid_work_option,
    weekly_hours,
};
use sprintsync_core::{CacheKey, CapacityCache, SprintWindow};
use sprintsync_domain::{
    CacheSettings, RawTeamMember, ScheduleEntry, Team, TeamMember, WorkOption, WorkingDay,
};

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
}

fn booked(member_id: i64, days: &[WorkingDay], value: WorkOption) -> Vec<ScheduleEntry> {
    days.iter()
        .filter(|d| d.is_working_day)
        .map(|d| ScheduleEntry::new(member_id, d.date, value))
        .collect()
}

/// Every length and every start weekday yields exactly `weeks * 5` working
/// days between start and computed end.
#[test]
fn sprint_end_date_spans_exact_working_days() {
    for offset in 0..7 {
        let start = sunday() + Duration::days(offset);
        for weeks in 1..=4u32 {
            let end = calculate_sprint_end_date(start, weeks).unwrap();
            let working = get_working_days(start, end).iter().filter(|d| d.is_working_day).count();
            assert_eq!(working as u32, weeks * 5);
        }
    }
}

#[test]
fn two_week_sprint_from_sunday_has_ten_working_days() {
    let window = SprintWindow::new(sunday(), 2, 1).unwrap();
    let working = window.days().into_iter().filter(|d| d.is_working_day).count();
    assert_eq!(working, 10);
}

/// Roles normalised from raw member records drive the daily cap.
#[test]
fn regular_and_manager_full_utilisation() {
    let window = SprintWindow::new(sunday(), 2, 1).unwrap();
    let days = window.days();

    let regular: TeamMember = RawTeamMember { id: 1, name: "Lior".into(), ..Default::default() }.into();
    let manager: TeamMember =
        RawTeamMember { id: 2, name: "Maya".into(), is_manager: Some(true), ..Default::default() }.into();

    let regular_summary = compute_member_summary(&regular, &days, &booked(1, &days, WorkOption::FullDay));
    assert_eq!(regular_summary.max_possible_hours, 70.0);
    assert_eq!(regular_summary.actual_hours, 70.0);
    assert_eq!(regular_summary.utilization_percentage, 100);

    let mut manager_entries = booked(2, &days, WorkOption::HalfDay);
    manager_entries.extend(auto_generate_weekend_entries(2, &days));
    let manager_summary = compute_member_summary(&manager, &days, &manager_entries);
    assert_eq!(manager_summary.max_possible_hours, 35.0);
    assert_eq!(manager_summary.actual_hours, 35.0);
    assert_eq!(manager_summary.utilization_percentage, 100);
    assert_eq!(manager_summary.completion_percentage, 100);

    assert!(!is_valid_work_option(WorkOption::FullDay, manager.role.is_manager()));
    assert!(is_valid_work_option(WorkOption::FullDay, regular.role.is_manager()));

    let weeks = weekly_hours(&manager, &window, &manager_entries);
    assert!(weeks.iter().all(|w| w.hours == 17.5 && w.max_hours == 17.5));
}

/// Cached team summaries are recomputed only after their team tag is
/// invalidated.
#[test]
fn cached_team_summary_follows_invalidation() {
    let window = SprintWindow::new(sunday(), 1, 1).unwrap();
    let days = window.days();
    let team = Team { id: 5, name: "Payments".into() };
    let members: Vec<TeamMember> =
        vec![RawTeamMember { id: 1, name: "Noa".into(), team_id: Some(5), ..Default::default() }.into()];
    let cache = CapacityCache::new(CacheSettings::default());

    let mut entries = BTreeMap::from([(1, booked(1, &days[..1], WorkOption::FullDay))]);
    let compute = |entries: &BTreeMap<i64, Vec<ScheduleEntry>>| -> sprintsync_domain::Result<_> {
        Ok(compute_team_summary(&team, &members, entries, &days))
    };

    let (first, outcome) = cache.team_summary(5, || compute(&entries)).unwrap();
    assert_eq!((first.utilization_percentage, outcome), (20, CacheOutcome::Miss));

    entries.insert(1, booked(1, &days, WorkOption::FullDay));
    let (stale, outcome) = cache.team_summary(5, || compute(&entries)).unwrap();
    assert_eq!((stale.utilization_percentage, outcome), (20, CacheOutcome::Hit));

    cache.invalidate(&team_tag(5));
    assert!(!cache.is_cache_valid(&CacheKey::TeamSummary(5)));

    let (fresh, outcome) = cache.team_summary(5, || compute(&entries)).unwrap();
    assert_eq!((fresh.utilization_percentage, outcome), (100, CacheOutcome::Miss));
}
