//! Working-day calendar types

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A single calendar day as seen by the capacity planner.
///
/// Working days run Sunday through Thursday; Friday and Saturday are the
/// weekend. Values are computed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u32,
    pub is_working_day: bool,
    pub is_weekend: bool,
    /// Reserved for a holiday calendar; currently always false
    pub is_holiday: bool,
}

impl WorkingDay {
    /// Classify `date`. `is_holiday` is supplied by the caller's holiday rule.
    pub fn classify(date: NaiveDate, is_holiday: bool) -> Self {
        let weekday = date.weekday();
        let is_weekend = matches!(weekday, Weekday::Fri | Weekday::Sat);
        Self {
            date,
            day_of_week: weekday.num_days_from_sunday(),
            is_working_day: !is_weekend,
            is_weekend,
            is_holiday,
        }
    }
}

/// Outcome of sprint configuration validation.
///
/// `errors` make the configuration invalid; `warnings` are informational and
/// never block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintConfigValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SprintConfigValidation {
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self { is_valid: errors.is_empty(), errors, warnings }
    }
}
