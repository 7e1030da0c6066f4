//! Schedule entries and the optimistic overlay

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{FULL_DAY_HOURS, HALF_DAY_HOURS};
use crate::impl_wire_conversions;

pub type MemberId = i64;
pub type TeamId = i64;

/// Value of a single schedule cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WorkOption {
    FullDay,
    HalfDay,
    Absent,
}

impl_wire_conversions!(WorkOption {
    FullDay => "1" | "FullDay" | "full_day" | "full",
    HalfDay => "0.5" | "HalfDay" | "half_day" | "half",
    Absent => "X" | "Absent" | "off",
});

impl WorkOption {
    /// Hours credited for one day with this value
    pub fn hours(self) -> f64 {
        match self {
            Self::FullDay => FULL_DAY_HOURS,
            Self::HalfDay => HALF_DAY_HOURS,
            Self::Absent => 0.0,
        }
    }
}

/// Identity of a schedule cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub member_id: MemberId,
    pub date: NaiveDate,
}

impl ScheduleKey {
    pub fn new(member_id: MemberId, date: NaiveDate) -> Self {
        Self { member_id, date }
    }
}

/// One member's value for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub value: WorkOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set on auto-generated weekend entries, which never count toward
    /// hours or completion
    #[serde(default)]
    pub is_weekend: bool,
}

impl ScheduleEntry {
    pub fn new(member_id: MemberId, date: NaiveDate, value: WorkOption) -> Self {
        Self {
            member_id,
            date,
            value,
            reason: None,
            created_at: None,
            updated_at: None,
            is_weekend: false,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn key(&self) -> ScheduleKey {
        ScheduleKey::new(self.member_id, self.date)
    }

    pub fn hours(&self) -> f64 {
        if self.is_weekend {
            0.0
        } else {
            self.value.hours()
        }
    }
}

/// Per-key synchronisation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntryState {
    /// Only the authoritative entry exists
    Committed,
    /// A local edit is waiting for (or undergoing) its commit
    Pending,
    /// The last commit for this key failed; the local value is kept
    Failed,
}

impl_wire_conversions!(EntryState {
    Committed => "committed" | "synced",
    Pending => "pending",
    Failed => "failed",
});

/// A locally applied, unconfirmed edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticEntry {
    pub entry: ScheduleEntry,
    pub pending: bool,
    pub failed: bool,
    pub edited_at: DateTime<Utc>,
    /// Increases with every local edit; commit outcomes for older revisions
    /// are ignored
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl OptimisticEntry {
    pub fn pending(entry: ScheduleEntry, edited_at: DateTime<Utc>, revision: u64) -> Self {
        Self { entry, pending: true, failed: false, edited_at, revision, last_error: None }
    }

    pub fn state(&self) -> EntryState {
        if self.failed {
            EntryState::Failed
        } else {
            EntryState::Pending
        }
    }
}

/// Effective view of a cell: optimistic value if present, else authoritative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCell {
    pub entry: ScheduleEntry,
    pub state: EntryState,
}
