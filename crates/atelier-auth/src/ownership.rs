//! Brand ownership held on profiles.

use std::collections::BTreeSet;

use atelier_core::error::AtelierResult;
use atelier_core::repository::ProfileRepository;
use tracing::info;
use uuid::Uuid;

/// Grants and revokes brand ownership.
///
/// Every call goes straight to the store, so the set returned by
/// [`owned_by`](Self::owned_by) is a snapshot and must be re-read before
/// each authorization decision.
#[derive(Clone)]
pub struct OwnershipRegistry<P> {
    profiles: P,
}

impl<P: ProfileRepository> OwnershipRegistry<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Idempotent. The brand must exist.
    pub async fn grant(&self, profile_id: Uuid, brand_id: Uuid) -> AtelierResult<BTreeSet<Uuid>> {
        let profile = self.profiles.grant_brand(profile_id, brand_id).await?;
        info!(%profile_id, %brand_id, "Brand ownership granted");
        Ok(profile.owned_brands)
    }

    /// No-op when the brand is not owned.
    pub async fn revoke(&self, profile_id: Uuid, brand_id: Uuid) -> AtelierResult<BTreeSet<Uuid>> {
        let profile = self.profiles.revoke_brand(profile_id, brand_id).await?;
        info!(%profile_id, %brand_id, "Brand ownership revoked");
        Ok(profile.owned_brands)
    }

    pub async fn owned_by(&self, profile_id: Uuid) -> AtelierResult<BTreeSet<Uuid>> {
        self.profiles.owned_brands(profile_id).await
    }
}
