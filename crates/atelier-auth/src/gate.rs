//! The authorization gate.
//!
//! [`authorize`] is the single policy function every brand-mutating path
//! consults. It is pure: role and ownership must already be resolved.

use std::collections::BTreeSet;
use std::fmt;

use atelier_core::models::role::Role;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AuthError;

/// Operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewBrand,
    CreateBrand,
    UpdateBrand,
    DeleteBrand,
    GrantOwnership,
    RevokeOwnership,
    AssignRole,
    DeleteProfile,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::ViewBrand,
        Action::CreateBrand,
        Action::UpdateBrand,
        Action::DeleteBrand,
        Action::GrantOwnership,
        Action::RevokeOwnership,
        Action::AssignRole,
        Action::DeleteProfile,
    ];

    /// Whether the action targets one existing brand. Brand-scoped actions
    /// are the only ones a `brand_admin` can be allowed.
    pub fn is_brand_scoped(self) -> bool {
        matches!(
            self,
            Action::ViewBrand
                | Action::UpdateBrand
                | Action::DeleteBrand
                | Action::GrantOwnership
                | Action::RevokeOwnership
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewBrand => "view_brand",
            Action::CreateBrand => "create_brand",
            Action::UpdateBrand => "update_brand",
            Action::DeleteBrand => "delete_brand",
            Action::GrantOwnership => "grant_ownership",
            Action::RevokeOwnership => "revoke_ownership",
            Action::AssignRole => "assign_role",
            Action::DeleteProfile => "delete_profile",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NotOwner,
    InsufficientRole,
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => AuthError::Unauthenticated,
            DenyReason::NotOwner => AuthError::NotOwner,
            DenyReason::InsufficientRole => AuthError::InsufficientRole,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// Convert to a `Result`, writing the audit line for a denial.
    ///
    /// The log names the requester, the action, and the target only; it
    /// never includes anyone's ownership set.
    pub fn into_result(
        self,
        subject: Option<Uuid>,
        action: Action,
        target: Option<Uuid>,
    ) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    subject = ?subject,
                    action = %action,
                    target = ?target,
                    reason = ?reason,
                    "Authorization denied"
                );
                Err(reason.into())
            }
        }
    }
}

/// Decide whether `role` holding `owned` may perform `action` on `target`.
///
/// `role` is `None` when no profile could be resolved for the request.
pub fn authorize(
    role: Option<Role>,
    owned: &BTreeSet<Uuid>,
    action: Action,
    target: Option<Uuid>,
) -> Decision {
    let Some(role) = role else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };
    match role {
        r if r.is_admin() => Decision::Allow,
        Role::BrandAdmin if !action.is_brand_scoped() => {
            Decision::Deny(DenyReason::InsufficientRole)
        }
        Role::BrandAdmin => match target {
            Some(brand) if owned.contains(&brand) => Decision::Allow,
            _ => Decision::Deny(DenyReason::NotOwner),
        },
        _ => Decision::Deny(DenyReason::InsufficientRole),
    }
}

/// Which brands a caller may see in the studio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Still to be intersected with the brands that exist.
    Only(BTreeSet<Uuid>),
    None,
}

pub fn visible_brands(role: Option<Role>, owned: &BTreeSet<Uuid>) -> Visibility {
    match role {
        Some(r) if r.is_admin() => Visibility::All,
        Some(Role::BrandAdmin) => Visibility::Only(owned.clone()),
        _ => Visibility::None,
    }
}
