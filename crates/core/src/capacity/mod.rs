//! Role-based capacity calculations
//!
//! Regular members can be booked for 7 hours per working day, managers for
//! 3.5. Weekend entries are bookkeeping only: they never add hours and are
//! not counted toward completion.

mod weekly;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use sprintsync_domain::constants::WEEKEND_REASON;
use sprintsync_domain::{
    CompanyCapacitySummary, MemberCapacitySummary, MemberId, Result, Role, ScheduleEntry,
    SprintSyncError, Team, TeamCapacitySummary, TeamMember, WorkOption, WorkingDay,
};

pub use self::weekly::weekly_hours;

const REGULAR_OPTIONS: &[WorkOption] = &[WorkOption::FullDay, WorkOption::HalfDay, WorkOption::Absent];
const MANAGER_OPTIONS: &[WorkOption] = &[WorkOption::HalfDay, WorkOption::Absent];

/// Maximum creditable hours per working day for `role`
pub fn daily_capacity(role: Role) -> f64 {
    role.daily_hours()
}

/// Values a member with `role` may be scheduled with
pub fn work_options_for(role: Role) -> &'static [WorkOption] {
    match role {
        Role::Regular => REGULAR_OPTIONS,
        Role::Manager => MANAGER_OPTIONS,
    }
}

/// `true` when `value` is among the options the member's role allows
pub fn is_valid_work_option(value: WorkOption, is_manager: bool) -> bool {
    let role = if is_manager { Role::Manager } else { Role::Regular };
    work_options_for(role).contains(&value)
}

/// Reject a value the member's role does not allow.
///
/// # Errors
/// `Validation` naming the member and the rejected value.
pub fn validate_work_option(member: &TeamMember, value: WorkOption) -> Result<()> {
    if is_valid_work_option(value, member.role.is_manager()) {
        Ok(())
    } else {
        Err(SprintSyncError::Validation(format!(
            "Work option {value} is not allowed for {} (member {})",
            member.role, member.id
        )))
    }
}

/// `round(part / whole * 100)`, 0 when `whole` is zero
pub fn percentage(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    let pct = (part / whole * 100.0).round();
    if pct <= 0.0 {
        0
    } else {
        // Utilisation can exceed 100% when remote data overbooks a member
        pct.min(f64::from(u32::MAX)) as u32
    }
}

fn count_pct(part: u32, whole: u32) -> u32 {
    percentage(f64::from(part), f64::from(whole))
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Absent placeholder entries for every weekend day in `days`.
pub fn auto_generate_weekend_entries(member_id: MemberId, days: &[WorkingDay]) -> Vec<ScheduleEntry> {
    days.iter()
        .filter(|day| day.is_weekend)
        .map(|day| ScheduleEntry {
            is_weekend: true,
            ..ScheduleEntry::new(member_id, day.date, WorkOption::Absent)
                .with_reason(Some(WEEKEND_REASON.to_string()))
        })
        .collect()
}

/// Capacity of one member over `working_days`.
///
/// Only entries on working days of the window count; weekend entries and
/// entries outside the window are ignored. When several entries share a
/// date the last one wins.
pub fn compute_member_summary(
    member: &TeamMember,
    working_days: &[WorkingDay],
    entries: &[ScheduleEntry],
) -> MemberCapacitySummary {
    let working: BTreeSet<NaiveDate> =
        working_days.iter().filter(|day| day.is_working_day).map(|day| day.date).collect();

    let by_date: BTreeMap<NaiveDate, &ScheduleEntry> = entries
        .iter()
        .filter(|entry| entry.member_id == member.id)
        .filter(|entry| !entry.is_weekend && working.contains(&entry.date))
        .map(|entry| (entry.date, entry))
        .collect();

    let mut actual_hours = 0.0;
    let (mut full_days, mut half_days, mut absent_days) = (0u32, 0u32, 0u32);
    for entry in by_date.values() {
        actual_hours += entry.hours();
        match entry.value {
            WorkOption::FullDay => full_days += 1,
            WorkOption::HalfDay => half_days += 1,
            WorkOption::Absent => absent_days += 1,
        }
    }

    let working_count = to_u32(working.len());
    let filled_days = to_u32(by_date.len());
    let max_possible_hours = f64::from(working_count) * daily_capacity(member.role);

    MemberCapacitySummary {
        member_id: member.id,
        name: member.name.clone(),
        role: member.role,
        working_days: working_count,
        max_possible_hours,
        actual_hours,
        utilization_percentage: percentage(actual_hours, max_possible_hours),
        filled_days,
        completion_percentage: count_pct(filled_days, working_count),
        full_days,
        half_days,
        absent_days,
    }
}

/// Aggregate member summaries for one team.
///
/// Members without an entry list are treated as having no entries.
pub fn compute_team_summary(
    team: &Team,
    members: &[TeamMember],
    entries_by_member: &BTreeMap<MemberId, Vec<ScheduleEntry>>,
    working_days: &[WorkingDay],
) -> TeamCapacitySummary {
    let summaries: Vec<MemberCapacitySummary> = members
        .iter()
        .map(|member| {
            let entries = entries_by_member.get(&member.id).map_or(&[][..], Vec::as_slice);
            compute_member_summary(member, working_days, entries)
        })
        .collect();

    let max_capacity_hours: f64 = summaries.iter().map(|s| s.max_possible_hours).sum();
    let actual_hours: f64 = summaries.iter().map(|s| s.actual_hours).sum();
    let filled_entries: u32 = summaries.iter().map(|s| s.filled_days).sum();
    let working_count = to_u32(working_days.iter().filter(|day| day.is_working_day).count());
    let total_possible_entries = to_u32(members.len()).saturating_mul(working_count);

    TeamCapacitySummary {
        team_id: team.id,
        team_name: team.name.clone(),
        member_count: to_u32(members.len()),
        manager_count: to_u32(members.iter().filter(|m| m.role.is_manager()).count()),
        max_capacity_hours,
        actual_hours,
        utilization_percentage: percentage(actual_hours, max_capacity_hours),
        filled_entries,
        total_possible_entries,
        completion_percentage: count_pct(filled_entries, total_possible_entries),
        members: summaries,
    }
}

/// Roll team summaries up to company level.
pub fn compute_company_summary(teams: Vec<TeamCapacitySummary>) -> CompanyCapacitySummary {
    let max_capacity_hours: f64 = teams.iter().map(|t| t.max_capacity_hours).sum();
    let actual_hours: f64 = teams.iter().map(|t| t.actual_hours).sum();
    let filled: u32 = teams.iter().map(|t| t.filled_entries).sum();
    let possible: u32 = teams.iter().map(|t| t.total_possible_entries).sum();

    CompanyCapacitySummary {
        team_count: to_u32(teams.len()),
        member_count: teams.iter().map(|t| t.member_count).sum(),
        max_capacity_hours,
        actual_hours,
        utilization_percentage: percentage(actual_hours, max_capacity_hours),
        completion_percentage: count_pct(filled, possible),
        teams,
    }
}
