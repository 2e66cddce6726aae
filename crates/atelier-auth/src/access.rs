//! Per-request access resolution: session token → principal.

use std::collections::BTreeSet;

use atelier_core::error::AtelierError;
use atelier_core::models::role::Role;
use atelier_core::models::session::Session;
use atelier_core::repository::ProfileRepository;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AuthError;
use crate::role::{ProfileRoleLookup, RoleResolver, RoleSource};
use crate::token::SessionValidator;

/// The authenticated caller of one request.
///
/// `owned_brands` is the snapshot taken at resolution time. Gated
/// operations re-read it before deciding.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub identity_id: Uuid,
    pub email: String,
    pub role: Role,
    pub owned_brands: BTreeSet<Uuid>,
}

#[derive(Clone)]
pub struct AccessResolver<P> {
    profiles: P,
    roles: RoleResolver,
    validator: SessionValidator,
}

impl<P: ProfileRepository> AccessResolver<P> {
    pub fn new(profiles: P, roles: RoleResolver, validator: SessionValidator) -> Self {
        Self {
            profiles,
            roles,
            validator,
        }
    }

    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    /// Validate a bearer token and resolve its principal.
    pub async fn principal_for_token(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let session = self.validator.validate(token)?;
        self.resolve(&session).await
    }

    /// Resolve role and ownership for a validated session.
    ///
    /// An allowlist promotion only applies to this request; the stored
    /// profile is never rewritten from it. A failed profile read degrades
    /// to the allowlist or `user`. A missing profile without an allowlist
    /// entry leaves the caller unauthenticated.
    pub async fn resolve(&self, session: &Session) -> Result<Principal, AuthError> {
        let (lookup, email, owned) = match self.profiles.get_by_id(session.identity_id).await {
            Ok(profile) => (
                ProfileRoleLookup::Found(profile.role),
                profile.email,
                profile.owned_brands,
            ),
            Err(AtelierError::NotFound { .. }) => {
                (ProfileRoleLookup::Absent, session.email.clone(), BTreeSet::new())
            }
            Err(e) => {
                warn!(
                    identity_id = %session.identity_id,
                    error = %e,
                    "Profile lookup failed"
                );
                (ProfileRoleLookup::Failed, session.email.clone(), BTreeSet::new())
            }
        };

        let resolution = self.roles.resolve_detailed(&email, lookup);
        if resolution.source == RoleSource::Default && lookup == ProfileRoleLookup::Absent {
            return Err(AuthError::Unauthenticated);
        }

        Ok(Principal {
            identity_id: session.identity_id,
            email,
            role: resolution.role,
            owned_brands: owned,
        })
    }
}
