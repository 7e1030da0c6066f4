//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Capacity
pub const FULL_DAY_HOURS: f64 = 7.0;
pub const HALF_DAY_HOURS: f64 = 3.5;
/// Managers are capped at half a day of delivery work per working day.
pub const MANAGER_DAILY_HOURS: f64 = 3.5;
pub const REGULAR_DAILY_HOURS: f64 = FULL_DAY_HOURS;

// Sprint calendar
pub const WORKING_DAYS_PER_WEEK: u32 = 5;
pub const MIN_SPRINT_WEEKS: u32 = 1;
pub const MAX_SPRINT_WEEKS: u32 = 4;
pub const WEEKEND_REASON: &str = "Weekend (auto-generated)";

// Optimistic store
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 10_000;
pub const STORE_COMMAND_BUFFER: usize = 256;

// Incremental sync
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

// Derived aggregate cache
pub const DEFAULT_SPRINT_TTL_SECS: u64 = 300;
pub const DEFAULT_TEAM_TTL_SECS: u64 = 120;
pub const DEFAULT_COMPANY_TTL_SECS: u64 = 60;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 512;

// Cache tags
pub const TAG_SPRINT: &str = "sprint";
pub const TAG_COMPANY: &str = "company";
pub const TAG_TEAM_PREFIX: &str = "team:";
