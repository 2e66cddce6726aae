//! SurrealDB implementation of [`ProfileRepository`].
//!
//! The record key is the identity id, so `CREATE` on an existing key
//! fails and two concurrent first-sight inserts cannot both succeed.
//! Ownership edits use `array::union` / `array::complement` inside a
//! single `UPDATE` so they always apply to the stored array.

use std::collections::BTreeSet;

use atelier_core::error::AtelierResult;
use atelier_core::models::profile::{CreateProfile, Profile};
use atelier_core::models::role::Role;
use atelier_core::repository::{PaginatedResult, Pagination, ProfileRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    role: String,
    owned_brands: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ProfileRowWithId {
    record_id: String,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    role: String,
    owned_brands: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_owned(raw: Vec<String>) -> Result<BTreeSet<Uuid>, DbError> {
    raw.iter().map(|s| parse_uuid(s, "brand")).collect()
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        Ok(Profile {
            id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            role: self
                .role
                .parse::<Role>()
                .map_err(|e| DbError::Decode(e.to_string()))?,
            owned_brands: parse_owned(self.owned_brands)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProfileRowWithId {
    fn try_into_profile(self) -> Result<Profile, DbError> {
        let id = parse_uuid(&self.record_id, "profile")?;
        ProfileRow {
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            role: self.role,
            owned_brands: self.owned_brands,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_profile(id)
    }
}

fn first_row(rows: Vec<ProfileRow>, id: Uuid) -> Result<Profile, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "profile".into(),
        id: id.to_string(),
    })?;
    row.into_profile(id)
}

/// SurrealDB implementation of the Profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, input: CreateProfile) -> AtelierResult<Profile> {
        let id = input.id;

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 email = $email, \
                 display_name = $display_name, \
                 avatar_url = $avatar_url, \
                 role = 'user', \
                 owned_brands = []",
            )
            .bind(("id", id.to_string()))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("avatar_url", input.avatar_url))
            .await
            .map_err(|e| DbError::from_statement("profile", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AtelierResult<Profile> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AtelierResult<Profile> {
        let result = self
            .db
            .query(
                "UPDATE type::record('profile', $id) SET \
                 role = $role, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(|e| DbError::from_statement("profile", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn grant_brand(&self, id: Uuid, brand_id: Uuid) -> AtelierResult<Profile> {
        // The existence check and the array edit run in one statement so a
        // concurrent brand deletion cannot leave a dangling reference.
        let result = self
            .db
            .query(
                "UPDATE type::record('profile', $id) SET \
                 owned_brands = array::union(owned_brands, [$brand_id]), \
                 updated_at = time::now() \
                 WHERE record::exists(type::record('brand', $brand_id))",
            )
            .bind(("id", id.to_string()))
            .bind(("brand_id", brand_id.to_string()))
            .await
            .map_err(|e| DbError::from_statement("profile", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_profile(id)?),
            None => {
                // Either the profile or the brand is missing.
                self.get_by_id(id).await?;
                Err(DbError::NotFound {
                    entity: "brand".into(),
                    id: brand_id.to_string(),
                }
                .into())
            }
        }
    }

    async fn revoke_brand(&self, id: Uuid, brand_id: Uuid) -> AtelierResult<Profile> {
        let result = self
            .db
            .query(
                "UPDATE type::record('profile', $id) SET \
                 owned_brands = array::complement(owned_brands, [$brand_id]), \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("brand_id", brand_id.to_string()))
            .await
            .map_err(|e| DbError::from_statement("profile", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("profile", e))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn owned_brands(&self, id: Uuid) -> AtelierResult<BTreeSet<Uuid>> {
        Ok(self.get_by_id(id).await?.owned_brands)
    }

    async fn delete(&self, id: Uuid) -> AtelierResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE brand SET created_by = NONE, updated_at = time::now() \
                 WHERE created_by = $id; \
                 DELETE type::record('profile', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(|e| DbError::from_statement("profile", e))?
            .check()
            .map_err(|e| DbError::from_statement("profile", e))?;

        debug!(profile_id = %id, "Profile deleted");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> AtelierResult<PaginatedResult<Profile>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM profile GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_profile())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
