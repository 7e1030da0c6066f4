//! Per-week hour totals within a sprint

use sprintsync_domain::{ScheduleEntry, TeamMember, WeeklyHours};

use super::daily_capacity;
use crate::calendar::SprintWindow;

/// Hours `member` is booked for in each week of `window`.
pub fn weekly_hours(member: &TeamMember, window: &SprintWindow, entries: &[ScheduleEntry]) -> Vec<WeeklyHours> {
    window
        .weeks()
        .into_iter()
        .map(|week| {
            let hours = week
                .days
                .iter()
                .filter(|day| day.is_working_day)
                .filter_map(|day| {
                    entries
                        .iter()
                        .rev()
                        .find(|entry| entry.member_id == member.id && entry.date == day.date)
                })
                .map(ScheduleEntry::hours)
                .sum();

            WeeklyHours {
                week_index: week.index,
                week_start: week.start,
                week_end: week.end,
                hours,
                max_hours: f64::from(week.working_day_count()) * daily_capacity(member.role),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sprintsync_domain::{Role, WorkOption};

    use super::*;

    #[test]
    fn splits_hours_by_week() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let window = SprintWindow::new(start, 2, 1).unwrap();
        let member = TeamMember { id: 3, name: "Ari".into(), team_id: None, role: Role::Manager };

        let entries = vec![
            ScheduleEntry::new(3, start, WorkOption::HalfDay),
            ScheduleEntry::new(3, NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(), WorkOption::HalfDay),
            ScheduleEntry::new(3, NaiveDate::from_ymd_opt(2024, 1, 23).unwrap(), WorkOption::Absent),
            // Another member's entry is ignored
            ScheduleEntry::new(4, start, WorkOption::FullDay),
        ];

        let weeks = weekly_hours(&member, &window, &entries);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].hours, 3.5);
        assert_eq!(weeks[1].hours, 3.5);
        assert_eq!(weeks[0].max_hours, 17.5);
        assert_eq!(weeks[1].week_end, window.end());
    }
}
