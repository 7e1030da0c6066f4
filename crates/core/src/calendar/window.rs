//! Validated sprint windows

use chrono::NaiveDate;
use serde::Serialize;
use sprintsync_domain::{RemoteSprintWindow, Result, SprintSyncError, WorkingDay};
use tracing::warn;

use super::{calculate_sprint_end_date, get_working_days, validate_sprint_config};

/// A sprint date range that passed validation.
///
/// There is no public constructor taking an arbitrary end date: windows are
/// derived from a start date and length, or accepted from the remote store
/// after [`validate_sprint_config`] reports no errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SprintWindow {
    start: NaiveDate,
    end: NaiveDate,
    length_weeks: u32,
    sprint_number: u32,
}

/// One seven-day slice of a sprint window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintWeek {
    /// Zero-based position within the sprint
    pub index: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<WorkingDay>,
}

impl SprintWeek {
    /// Sunday-to-Thursday days in this slice
    pub fn working_day_count(&self) -> u32 {
        u32::try_from(self.days.iter().filter(|day| day.is_working_day).count()).unwrap_or(u32::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl SprintWindow {
    /// Derive a window from its start date and length.
    pub fn new(start: NaiveDate, length_weeks: u32, sprint_number: u32) -> Result<Self> {
        let end = calculate_sprint_end_date(start, length_weeks)?;
        Ok(Self { start, end, length_weeks, sprint_number })
    }

    /// Accept a window published by the remote store.
    ///
    /// Validation errors reject the window; warnings are logged only.
    pub fn from_remote(remote: RemoteSprintWindow) -> Result<Self> {
        let validation = validate_sprint_config(remote.start, remote.end, remote.length_weeks);
        if !validation.is_valid {
            return Err(SprintSyncError::Validation(validation.errors.join("; ")));
        }
        for warning in &validation.warnings {
            warn!(sprint_number = remote.sprint_number, warning = %warning, "sprint config warning");
        }

        Ok(Self {
            start: remote.start,
            end: remote.end,
            length_weeks: remote.length_weeks,
            sprint_number: remote.sprint_number,
        })
    }

    /// First day of the sprint
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the sprint, inclusive
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn length_weeks(&self) -> u32 {
        self.length_weeks
    }

    pub fn sprint_number(&self) -> u32 {
        self.sprint_number
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the window, weekends included
    pub fn days(&self) -> Vec<WorkingDay> {
        get_working_days(self.start, self.end)
    }

    /// Split the window into consecutive seven-day weeks starting at `start`.
    ///
    /// Any seven consecutive days hold exactly five working days, so every
    /// full week carries a full week of capacity regardless of the start
    /// weekday. The final slice is truncated at `end`.
    pub fn weeks(&self) -> Vec<SprintWeek> {
        let days = self.days();
        days.chunks(7)
            .zip(0u32..)
            .filter_map(|(chunk, index)| {
                let first = chunk.first()?;
                let last = chunk.last()?;
                Some(SprintWeek { index, start: first.date, end: last.date, days: chunk.to_vec() })
            })
            .collect()
    }
}

impl TryFrom<RemoteSprintWindow> for SprintWindow {
    type Error = SprintSyncError;

    fn try_from(remote: RemoteSprintWindow) -> Result<Self> {
        Self::from_remote(remote)
    }
}
