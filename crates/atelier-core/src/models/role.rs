//! Authorization role model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AtelierError;

/// The authorization role attached to a profile.
///
/// Stored and serialized in snake case (`user`, `brand_admin`, `admin`,
/// `super_admin`). `User` is the default assigned at first sight.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    BrandAdmin,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::BrandAdmin, Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::BrandAdmin => "brand_admin",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// `admin` and `super_admin` are equivalent for authorization.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AtelierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "brand_admin" => Ok(Role::BrandAdmin),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(AtelierError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_form_roundtrips() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("superadmin".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::BrandAdmin).unwrap();
        assert_eq!(json, "\"brand_admin\"");
    }

    #[test]
    fn admin_equivalence() {
        assert!(Role::Admin.is_admin());
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::BrandAdmin.is_admin());
        assert!(!Role::User.is_admin());
    }
}
