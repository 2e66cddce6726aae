//! Gated studio operations.
//!
//! Every mutation here resolves fresh ownership, consults
//! [`gate::authorize`], and only then touches the store. A denial returns
//! before any write.

use std::collections::BTreeSet;

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::brand::{Brand, CreateBrand, UpdateBrand};
use atelier_core::models::profile::Profile;
use atelier_core::models::role::Role;
use atelier_core::repository::{BrandRepository, PaginatedResult, Pagination, ProfileRepository};
use tracing::info;
use uuid::Uuid;

use crate::access::Principal;
use crate::error::AuthError;
use crate::gate::{self, Action, Visibility};
use crate::ownership::OwnershipRegistry;

/// Input for [`StudioService::create_brand`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewBrand {
    pub name: String,
    pub slug: String,
}

#[derive(Clone)]
pub struct StudioService<P, B> {
    profiles: P,
    brands: B,
    ownership: OwnershipRegistry<P>,
}

impl<P, B> StudioService<P, B>
where
    P: ProfileRepository + Clone,
    B: BrandRepository,
{
    pub fn new(profiles: P, brands: B) -> Self {
        Self {
            ownership: OwnershipRegistry::new(profiles.clone()),
            profiles,
            brands,
        }
    }

    /// Ownership as stored right now. Only `brand_admin` decisions depend
    /// on it.
    async fn current_owned(&self, principal: &Principal) -> AtelierResult<BTreeSet<Uuid>> {
        if principal.role != Role::BrandAdmin {
            return Ok(BTreeSet::new());
        }
        match self.ownership.owned_by(principal.identity_id).await {
            Ok(owned) => Ok(owned),
            // Profile vanished mid-session.
            Err(AtelierError::NotFound { .. }) => Err(AuthError::Unauthenticated.into()),
            Err(e) => Err(e),
        }
    }

    async fn check(
        &self,
        principal: &Principal,
        action: Action,
        target: Option<Uuid>,
    ) -> AtelierResult<()> {
        let owned = self.current_owned(principal).await?;
        gate::authorize(Some(principal.role), &owned, action, target).into_result(
            Some(principal.identity_id),
            action,
            target,
        )?;
        Ok(())
    }

    pub async fn visible_brands(
        &self,
        principal: &Principal,
        pagination: Pagination,
    ) -> AtelierResult<PaginatedResult<Brand>> {
        let owned = self.current_owned(principal).await?;
        match gate::visible_brands(Some(principal.role), &owned) {
            Visibility::All => self.brands.list(pagination).await,
            Visibility::Only(ids) => {
                let all = self.brands.list_by_ids(&ids).await?;
                let total = all.len() as u64;
                let items = all
                    .into_iter()
                    .skip(pagination.offset as usize)
                    .take(pagination.limit as usize)
                    .collect();
                Ok(PaginatedResult {
                    items,
                    total,
                    offset: pagination.offset,
                    limit: pagination.limit,
                })
            }
            Visibility::None => Ok(PaginatedResult {
                items: Vec::new(),
                total: 0,
                offset: pagination.offset,
                limit: pagination.limit,
            }),
        }
    }

    pub async fn get_brand(&self, principal: &Principal, brand_id: Uuid) -> AtelierResult<Brand> {
        self.check(principal, Action::ViewBrand, Some(brand_id)).await?;
        self.brands.get_by_id(brand_id).await
    }

    pub async fn create_brand(&self, principal: &Principal, input: NewBrand) -> AtelierResult<Brand> {
        self.check(principal, Action::CreateBrand, None).await?;
        validate_brand_fields(Some(&input.name), Some(&input.slug))?;
        let brand = self
            .brands
            .create(CreateBrand {
                name: input.name,
                slug: input.slug,
                created_by: Some(principal.identity_id),
            })
            .await?;
        info!(brand_id = %brand.id, actor = %principal.identity_id, "Brand created");
        Ok(brand)
    }

    pub async fn update_brand(
        &self,
        principal: &Principal,
        brand_id: Uuid,
        input: UpdateBrand,
    ) -> AtelierResult<Brand> {
        self.check(principal, Action::UpdateBrand, Some(brand_id)).await?;
        validate_brand_fields(input.name.as_deref(), input.slug.as_deref())?;
        self.brands.update(brand_id, input).await
    }

    /// Deletes the brand and retracts it from every owner in one step.
    pub async fn delete_brand(&self, principal: &Principal, brand_id: Uuid) -> AtelierResult<()> {
        self.check(principal, Action::DeleteBrand, Some(brand_id)).await?;
        self.brands.delete(brand_id).await?;
        info!(%brand_id, actor = %principal.identity_id, "Brand deleted");
        Ok(())
    }

    pub async fn grant_ownership(
        &self,
        principal: &Principal,
        brand_id: Uuid,
        profile_id: Uuid,
    ) -> AtelierResult<BTreeSet<Uuid>> {
        self.check(principal, Action::GrantOwnership, Some(brand_id))
            .await?;
        self.ownership.grant(profile_id, brand_id).await
    }

    pub async fn revoke_ownership(
        &self,
        principal: &Principal,
        brand_id: Uuid,
        profile_id: Uuid,
    ) -> AtelierResult<BTreeSet<Uuid>> {
        self.check(principal, Action::RevokeOwnership, Some(brand_id))
            .await?;
        self.ownership.revoke(profile_id, brand_id).await
    }

    pub async fn set_role(
        &self,
        principal: &Principal,
        profile_id: Uuid,
        role: Role,
    ) -> AtelierResult<Profile> {
        self.check(principal, Action::AssignRole, None).await?;
        let profile = self.profiles.set_role(profile_id, role).await?;
        info!(%profile_id, role = %role, actor = %principal.identity_id, "Role assigned");
        Ok(profile)
    }

    /// Removes the profile and clears every `created_by` pointing at it.
    pub async fn delete_profile(&self, principal: &Principal, profile_id: Uuid) -> AtelierResult<()> {
        self.check(principal, Action::DeleteProfile, None).await?;
        self.profiles.delete(profile_id).await?;
        info!(%profile_id, actor = %principal.identity_id, "Profile deleted");
        Ok(())
    }
}

fn validate_brand_fields(name: Option<&str>, slug: Option<&str>) -> AtelierResult<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(AtelierError::Validation {
                message: "brand name must not be empty".into(),
            });
        }
    }
    if let Some(slug) = slug {
        let valid = !slug.is_empty()
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(AtelierError::Validation {
                message: format!("invalid brand slug '{slug}'"),
            });
        }
    }
    Ok(())
}
