//! Team roster types

use serde::{Deserialize, Serialize};

use super::remote::{RawTeamMember, RemoteTeam};
use super::schedule::{MemberId, TeamId};
use crate::constants::{MANAGER_DAILY_HOURS, REGULAR_DAILY_HOURS};
use crate::impl_wire_conversions;

/// Capacity role of a member, normalised once at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    #[default]
    Regular,
    Manager,
}

impl_wire_conversions!(Role {
    Regular => "regular" | "member" | "developer",
    Manager => "manager" | "team_manager" | "team manager",
});

impl Role {
    /// Fold the optional role hints of a raw member record into one role.
    ///
    /// An explicit `is_manager` flag wins; otherwise the `role` string is
    /// parsed, and finally a title mentioning "manager" is honoured.
    pub fn from_raw(raw: &RawTeamMember) -> Self {
        if let Some(flag) = raw.is_manager {
            return if flag { Self::Manager } else { Self::Regular };
        }
        if let Some(role) = raw.role.as_deref().and_then(|r| r.parse::<Self>().ok()) {
            return role;
        }
        match raw.title.as_deref() {
            Some(title) if title.to_ascii_lowercase().contains("manager") => Self::Manager,
            _ => Self::Regular,
        }
    }

    pub fn is_manager(self) -> bool {
        self == Self::Manager
    }

    /// Maximum creditable hours per working day
    pub fn daily_hours(self) -> f64 {
        match self {
            Self::Regular => REGULAR_DAILY_HOURS,
            Self::Manager => MANAGER_DAILY_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    pub team_id: Option<TeamId>,
    pub role: Role,
}

impl From<RawTeamMember> for TeamMember {
    fn from(raw: RawTeamMember) -> Self {
        let role = Role::from_raw(&raw);
        Self { id: raw.id, name: raw.name, team_id: raw.team_id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

impl From<RemoteTeam> for Team {
    fn from(remote: RemoteTeam) -> Self {
        Self { id: remote.id, name: remote.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawTeamMember {
        RawTeamMember { id: 1, name: "Noa".into(), ..RawTeamMember::default() }
    }

    #[test]
    fn explicit_flag_wins_over_role_string() {
        let member = RawTeamMember {
            is_manager: Some(false),
            role: Some("manager".into()),
            ..raw()
        };
        assert_eq!(Role::from_raw(&member), Role::Regular);
    }

    #[test]
    fn role_string_and_title_are_fallbacks() {
        let by_role = RawTeamMember { role: Some("Team Manager".into()), ..raw() };
        assert_eq!(Role::from_raw(&by_role), Role::Manager);

        let by_title = RawTeamMember { title: Some("Engineering Manager".into()), ..raw() };
        assert_eq!(Role::from_raw(&by_title), Role::Manager);

        assert_eq!(Role::from_raw(&raw()), Role::Regular);
    }

    #[test]
    fn daily_hours_by_role() {
        assert_eq!(Role::Regular.daily_hours(), 7.0);
        assert_eq!(Role::Manager.daily_hours(), 3.5);
    }
}
