/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privilege hierarchy: `default < admin < root`
///
/// Variant order is the privilege order, so the derived `Ord` is what every
/// authorization comparison uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Default,
    Admin,
    Root,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Default => "default",
            Role::Admin => "admin",
            Role::Root => "root",
        }
    }

    /// Admin and root accounts can only be mutated by root
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Root)
    }

    /// Roles that may be handed out through the admin API. Root never is.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Role::Default | Role::Admin)
    }

    /// Check if this role has at least the privileges of the required role
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Default
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Role::Default),
            "admin" => Ok(Role::Admin),
            "root" => Ok(Role::Root),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
