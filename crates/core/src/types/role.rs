//! Authorization role attached to a user profile.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The profile carried an empty role string.
    #[error("role cannot be empty")]
    Empty,
}

/// Role classifier stored on the `profiles` record.
///
/// Only `"admin"` grants access to the dashboard. Every other value is kept
/// verbatim so it can be reported in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Dashboard administrator.
    Admin,
    /// Any other classifier (e.g. `"vendor"`, `"customer"`).
    Other(String),
}

impl Role {
    const ADMIN: &'static str = "admin";

    /// Parse a role string. Matching is exact: `"Admin"` is not an admin.
    ///
    /// # Errors
    ///
    /// Returns `RoleError::Empty` if the input is empty or whitespace.
    pub fn parse(s: &str) -> Result<Self, RoleError> {
        if s.trim().is_empty() {
            return Err(RoleError::Empty);
        }
        if s == Self::ADMIN {
            Ok(Self::Admin)
        } else {
            Ok(Self::Other(s.to_owned()))
        }
    }

    /// Whether this role may open the dashboard.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The role as stored by the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => Self::ADMIN,
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Role {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Role::ADMIN.to_owned(),
            Role::Other(s) => s,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_exact_match() {
        assert!(Role::parse("admin").unwrap().is_admin());
        assert!(!Role::parse("Admin").unwrap().is_admin());
        assert!(!Role::parse("vendor").unwrap().is_admin());
    }

    #[test]
    fn test_other_roles_round_trip_text() {
        let role = Role::parse("vendor").unwrap();
        assert_eq!(role.to_string(), "vendor");
        assert_eq!(String::from(role), "vendor");
    }

    #[test]
    fn test_empty_role_rejected() {
        assert_eq!(Role::parse(" "), Err(RoleError::Empty));
        assert!(serde_json::from_str::<Role>(r#""""#).is_err());
    }

    #[test]
    fn test_deserialize_profile_role() {
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
    }
}
