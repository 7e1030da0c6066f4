//! Working-day calendar for sprint planning
//!
//! Sunday through Thursday are working days; Friday and Saturday form the
//! weekend. All functions are pure and allocation is proportional to the
//! number of days inspected.

mod window;

use chrono::NaiveDate;
use sprintsync_domain::constants::{MAX_SPRINT_WEEKS, MIN_SPRINT_WEEKS, WORKING_DAYS_PER_WEEK};
use sprintsync_domain::{Result, SprintConfigValidation, SprintSyncError, WorkingDay};

pub use self::window::{SprintWeek, SprintWindow};

/// Holiday rule. No holiday calendar is wired in yet, so this never matches.
pub fn is_holiday(_date: NaiveDate) -> bool {
    false
}

/// Classify a single date.
pub fn working_day(date: NaiveDate) -> WorkingDay {
    WorkingDay::classify(date, is_holiday(date))
}

/// Every day in `[start, end]`, in order. Empty when `start > end`.
pub fn get_working_days(start: NaiveDate, end: NaiveDate) -> Vec<WorkingDay> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|date| *date <= end).map(working_day).collect()
}

/// Number of working days in `[start, end]`.
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }
    let count = start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| working_day(*date).is_working_day)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn ensure_length_in_range(length_weeks: u32) -> Result<()> {
    if (MIN_SPRINT_WEEKS..=MAX_SPRINT_WEEKS).contains(&length_weeks) {
        Ok(())
    } else {
        Err(SprintSyncError::Validation(length_error(length_weeks)))
    }
}

fn length_error(length_weeks: u32) -> String {
    format!(
        "Sprint length must be between {MIN_SPRINT_WEEKS} and {MAX_SPRINT_WEEKS} weeks (got {length_weeks})"
    )
}

/// Date of the last working day of a sprint starting at `start`.
///
/// Walks forward one day at a time counting working days until
/// `length_weeks * 5` have been seen. `start` counts when it is itself a
/// working day.
///
/// # Errors
/// `Validation` when `length_weeks` is outside `1..=4`.
pub fn calculate_sprint_end_date(start: NaiveDate, length_weeks: u32) -> Result<NaiveDate> {
    ensure_length_in_range(length_weeks)?;

    let target = length_weeks * WORKING_DAYS_PER_WEEK;
    let mut counted = 0;
    for date in start.iter_days() {
        if working_day(date).is_working_day {
            counted += 1;
            if counted == target {
                return Ok(date);
            }
        }
    }

    Err(SprintSyncError::Validation(format!("Sprint starting {start} runs past the calendar range")))
}

/// Check a sprint configuration.
///
/// Errors: `start > end`, length outside `1..=4`, or a working-day count in
/// `[start, end]` different from `length_weeks * 5`. Warnings never block:
/// start or end falling on a weekend, and fewer weekend days inside the
/// window than the `length_weeks - 1` full weekends it should span.
pub fn validate_sprint_config(
    start: NaiveDate,
    end: NaiveDate,
    length_weeks: u32,
) -> SprintConfigValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if start > end {
        errors.push(format!("Sprint start {start} is after sprint end {end}"));
    }

    let length_ok = ensure_length_in_range(length_weeks).is_ok();
    if !length_ok {
        errors.push(length_error(length_weeks));
    }

    if start <= end {
        let days = get_working_days(start, end);
        let working = days.iter().filter(|day| day.is_working_day).count();
        let weekend = days.iter().filter(|day| day.is_weekend).count();

        if length_ok {
            let expected = (length_weeks * WORKING_DAYS_PER_WEEK) as usize;
            if working != expected {
                errors.push(format!(
                    "Sprint window has {working} working days, expected {expected} for {length_weeks} week(s)"
                ));
            }

            let expected_weekend = 2 * (length_weeks as usize - 1);
            if weekend < expected_weekend {
                warnings.push(format!(
                    "Sprint window covers {weekend} weekend days, expected at least {expected_weekend}"
                ));
            }
        }

        if !working_day(start).is_working_day {
            warnings.push(format!("Sprint starts on a non-working day ({start})"));
        }
        if !working_day(end).is_working_day {
            warnings.push(format!("Sprint ends on a non-working day ({end})"));
        }
    }

    SprintConfigValidation::from_findings(errors, warnings)
}
