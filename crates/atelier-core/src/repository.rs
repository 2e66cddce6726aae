//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Mutations act on the current
//! stored row rather than on a caller-held copy, so concurrent ownership
//! grants and revocations never overwrite one another.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::AtelierResult;
use crate::models::{
    brand::{Brand, CreateBrand, UpdateBrand},
    profile::{CreateProfile, Profile},
    role::Role,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

pub trait ProfileRepository: Send + Sync {
    /// Insert a new profile keyed by the identity id.
    ///
    /// Returns [`AtelierError::AlreadyExists`](crate::error::AtelierError)
    /// if a profile with that id is already stored, including when a
    /// concurrent insert wins the race.
    fn create(&self, input: CreateProfile) -> impl Future<Output = AtelierResult<Profile>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AtelierResult<Profile>> + Send;
    fn set_role(&self, id: Uuid, role: Role) -> impl Future<Output = AtelierResult<Profile>> + Send;

    /// Add a brand to the profile's ownership set. Adding an already
    /// owned brand is a no-op. Fails with `NotFound` if either the
    /// profile or the brand does not exist.
    fn grant_brand(
        &self,
        id: Uuid,
        brand_id: Uuid,
    ) -> impl Future<Output = AtelierResult<Profile>> + Send;

    /// Remove a brand from the profile's ownership set. Removing a brand
    /// that is not owned is a no-op.
    fn revoke_brand(
        &self,
        id: Uuid,
        brand_id: Uuid,
    ) -> impl Future<Output = AtelierResult<Profile>> + Send;

    /// Fresh read of the ownership set.
    fn owned_brands(&self, id: Uuid) -> impl Future<Output = AtelierResult<BTreeSet<Uuid>>> + Send;

    /// Hard-delete a profile, clearing every `Brand.created_by`
    /// reference to it in the same transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = AtelierResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<Profile>>> + Send;
}

// ---------------------------------------------------------------------------
// Brands
// ---------------------------------------------------------------------------

pub trait BrandRepository: Send + Sync {
    fn create(&self, input: CreateBrand) -> impl Future<Output = AtelierResult<Brand>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AtelierResult<Brand>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateBrand,
    ) -> impl Future<Output = AtelierResult<Brand>> + Send;

    /// Delete a brand and retract it from every profile's ownership set
    /// in one transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = AtelierResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<Brand>>> + Send;

    /// The subset of `ids` that refer to existing brands.
    fn list_by_ids(
        &self,
        ids: &BTreeSet<Uuid>,
    ) -> impl Future<Output = AtelierResult<Vec<Brand>>> + Send;
}
