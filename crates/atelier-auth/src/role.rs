//! Role resolution with the legacy allowlist fallback.

use atelier_core::models::role::Role;
use tracing::warn;

use crate::config::LegacyRoleAllowlist;

/// Outcome of reading an identity's role from its profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRoleLookup {
    Found(Role),
    /// The read succeeded but no profile row exists.
    Absent,
    /// The read itself failed.
    Failed,
}

/// Where a resolved role came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    Profile,
    LegacyAllowlist,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleResolution {
    pub role: Role,
    pub source: RoleSource,
}

/// Resolves the effective role for an identity.
///
/// The profile is authoritative. The allowlist is consulted only when the
/// profile holds the default `user` role, is missing, or could not be
/// read, and every time it changes the answer a warning is logged.
#[derive(Debug, Clone, Default)]
pub struct RoleResolver {
    allowlist: LegacyRoleAllowlist,
}

impl RoleResolver {
    pub fn new(allowlist: LegacyRoleAllowlist) -> Self {
        Self { allowlist }
    }

    pub fn resolve(&self, email: &str, lookup: ProfileRoleLookup) -> Role {
        self.resolve_detailed(email, lookup).role
    }

    pub fn resolve_detailed(&self, email: &str, lookup: ProfileRoleLookup) -> RoleResolution {
        match lookup {
            ProfileRoleLookup::Found(role) if role != Role::User => RoleResolution {
                role,
                source: RoleSource::Profile,
            },
            ProfileRoleLookup::Found(_) | ProfileRoleLookup::Absent | ProfileRoleLookup::Failed => {
                match self.allowlist.role_for(email) {
                    Some(role) => {
                        warn!(
                            email,
                            role = %role,
                            lookup = ?lookup,
                            "Role taken from legacy allowlist"
                        );
                        RoleResolution {
                            role,
                            source: RoleSource::LegacyAllowlist,
                        }
                    }
                    None => RoleResolution {
                        role: Role::User,
                        source: if matches!(lookup, ProfileRoleLookup::Found(_)) {
                            RoleSource::Profile
                        } else {
                            RoleSource::Default
                        },
                    },
                }
            }
        }
    }
}
