//! Derived capacity aggregates
//!
//! Recomputed on demand and cached with a TTL by the capacity cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::schedule::{MemberId, TeamId};
use super::team::Role;

/// Capacity of one member over a set of working days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCapacitySummary {
    pub member_id: MemberId,
    pub name: String,
    pub role: Role,
    pub working_days: u32,
    pub max_possible_hours: f64,
    pub actual_hours: f64,
    pub utilization_percentage: u32,
    /// Working days that carry an entry
    pub filled_days: u32,
    pub completion_percentage: u32,
    pub full_days: u32,
    pub half_days: u32,
    pub absent_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCapacitySummary {
    pub team_id: TeamId,
    pub team_name: String,
    pub member_count: u32,
    pub manager_count: u32,
    pub max_capacity_hours: f64,
    pub actual_hours: f64,
    pub utilization_percentage: u32,
    pub filled_entries: u32,
    pub total_possible_entries: u32,
    pub completion_percentage: u32,
    pub members: Vec<MemberCapacitySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCapacitySummary {
    pub team_count: u32,
    pub member_count: u32,
    pub max_capacity_hours: f64,
    pub actual_hours: f64,
    pub utilization_percentage: u32,
    pub completion_percentage: u32,
    pub teams: Vec<TeamCapacitySummary>,
}

/// Hours a member recorded in one sprint week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHours {
    /// Zero-based week number within the sprint
    pub week_index: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub hours: f64,
    pub max_hours: f64,
}
