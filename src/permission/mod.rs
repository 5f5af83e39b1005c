//! Who may do what.
//!
//! Reading is open to everybody. Managing competitions (and everything below
//! them) and users is for admins; submitting scores is for judges and admins.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{auth::User, util_resp::FailureResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Judge,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Judge, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Judge => "judge",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "judge" => Ok(Role::Judge),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageCompetitions,
    ManageUsers,
    SubmitScores,
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        match (self, permission) {
            (Role::Admin, _) => true,
            (Role::Judge, Permission::SubmitScores) => true,
            _ => false,
        }
    }
}

pub fn require(user: &User, permission: Permission) -> Result<(), FailureResponse> {
    if user.role().allows(permission) {
        Ok(())
    } else {
        tracing::debug!(
            user = %user.username,
            ?permission,
            "permission denied"
        );
        Err(FailureResponse::Unauthorized(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judges_can_only_score() {
        assert!(Role::Judge.allows(Permission::SubmitScores));
        assert!(!Role::Judge.allows(Permission::ManageCompetitions));
        assert!(!Role::Viewer.allows(Permission::SubmitScores));
        assert!(Role::Admin.allows(Permission::ManageUsers));
    }

    #[test]
    fn roles_round_trip_through_their_column_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
