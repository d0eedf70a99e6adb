//! Roles and the permission predicates derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a person.
///
/// Studio staff roles are ordered from most to least privileged; `Client`
/// and `Vendor` are external accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Studio administrator.
    Admin,
    /// Production manager.
    Manager,
    /// Department supervisor.
    Supervisor,
    /// Regular studio member (artist).
    #[default]
    User,
    /// External client reviewing productions.
    Client,
    /// External vendor working on assigned tasks.
    Vendor,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 6] = [
        Self::Admin,
        Self::Manager,
        Self::Supervisor,
        Self::User,
        Self::Client,
        Self::Vendor,
    ];

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can manage productions (admin or manager).
    #[must_use]
    pub fn has_manager_permissions(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Returns true if this role may manage person records of the studio.
    ///
    /// Granted to every staff role, never to external accounts.
    #[must_use]
    pub fn has_person_permissions(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Manager | Self::Supervisor | Self::User
        )
    }

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Supervisor => "supervisor",
            Self::User => "user",
            Self::Client => "client",
            Self::Vendor => "vendor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
