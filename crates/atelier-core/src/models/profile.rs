//! Profile domain model.
//!
//! A profile is the durable authorization record for an identity:
//! its role and the set of brands it may manage. The profile id is the
//! identity id, so at most one profile can exist per identity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;
use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the identity id.
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    /// Brands this profile may manage. Only meaningful for `brand_admin`.
    pub owned_brands: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a profile at first sight.
///
/// Role is always `user` and the ownership set always empty on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Identity> for CreateProfile {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
        }
    }
}
