//! The only state persisted locally between sessions.
//!
//! Schedule entries and derived caches are deliberately excluded; they are
//! rebuilt from the persistence service on every load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::TeamId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub selected_team_id: Option<TeamId>,
    #[serde(default)]
    pub active_tab_id: Option<String>,
    #[serde(default)]
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}
