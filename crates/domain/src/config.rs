//! Application configuration structures
//!
//! Loading (env vars, config files) lives in `sprintsync-infra::config`. Every
//! section has defaults so a partial file is accepted.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_COMMIT_TIMEOUT_MS, DEFAULT_COMPANY_TTL_SECS,
    DEFAULT_DEBOUNCE_MS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SPRINT_TTL_SECS,
    DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_TEAM_TTL_SECS,
};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub sync: SyncConfig,
    pub cache: CacheSettings,
    pub session: SessionConfig,
}

/// Optimistic store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Quiet period before an edited cell is committed
    pub debounce_ms: u64,
    /// Upper bound on a single remote write; expiry counts as a failed commit
    pub commit_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { debounce_ms: DEFAULT_DEBOUNCE_MS, commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS }
    }
}

impl ScheduleConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

/// Incremental sync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_seconds: u64,
    pub enabled: bool,
    pub fetch_timeout_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_SYNC_INTERVAL_SECS,
            enabled: true,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds.max(1))
    }
}

/// TTLs for derived aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub sprint_ttl_seconds: u64,
    pub team_ttl_seconds: u64,
    pub company_ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            sprint_ttl_seconds: DEFAULT_SPRINT_TTL_SECS,
            team_ttl_seconds: DEFAULT_TEAM_TTL_SECS,
            company_ttl_seconds: DEFAULT_COMPANY_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheSettings {
    pub fn sprint_ttl(&self) -> Duration {
        Duration::from_secs(self.sprint_ttl_seconds)
    }

    pub fn team_ttl(&self) -> Duration {
        Duration::from_secs(self.team_ttl_seconds)
    }

    pub fn company_ttl(&self) -> Duration {
        Duration::from_secs(self.company_ttl_seconds)
    }
}

/// Where the small persisted session file lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("sprintsync-session.json") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            debounce_ms = 250

            [sync]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.debounce(), Duration::from_millis(250));
        assert_eq!(config.schedule.commit_timeout_ms, DEFAULT_COMMIT_TIMEOUT_MS);
        assert!(!config.sync.enabled);
        assert_eq!(config.sync.interval_seconds, DEFAULT_SYNC_INTERVAL_SECS);
        assert_eq!(config.cache, CacheSettings::default());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let sync = SyncConfig { interval_seconds: 0, ..SyncConfig::default() };
        assert_eq!(sync.interval(), Duration::from_secs(1));
    }
}
