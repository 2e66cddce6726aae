//! SurrealDB implementation of [`BrandRepository`].

use std::collections::BTreeSet;

use atelier_core::error::AtelierResult;
use atelier_core::models::brand::{Brand, CreateBrand, UpdateBrand};
use atelier_core::repository::{BrandRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct BrandRow {
    name: String,
    slug: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BrandRowWithId {
    record_id: String,
    name: String,
    slug: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BrandRow {
    fn into_brand(self, id: Uuid) -> Result<Brand, DbError> {
        let created_by = self
            .created_by
            .as_deref()
            .map(|raw| parse_uuid(raw, "profile"))
            .transpose()?;
        Ok(Brand {
            id,
            name: self.name,
            slug: self.slug,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BrandRowWithId {
    fn try_into_brand(self) -> Result<Brand, DbError> {
        let id = parse_uuid(&self.record_id, "brand")?;
        BrandRow {
            name: self.name,
            slug: self.slug,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_brand(id)
    }
}

fn first_row(rows: Vec<BrandRow>, id: Uuid) -> Result<Brand, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "brand".into(),
        id: id.to_string(),
    })?;
    row.into_brand(id)
}

/// SurrealDB implementation of the Brand repository.
#[derive(Clone)]
pub struct SurrealBrandRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBrandRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BrandRepository for SurrealBrandRepository<C> {
    async fn create(&self, input: CreateBrand) -> AtelierResult<Brand> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('brand', $id) SET \
                 name = $name, slug = $slug, \
                 created_by = $created_by",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("created_by", input.created_by.map(|p| p.to_string())))
            .await
            .map_err(|e| DbError::from_statement("brand", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("brand", e))?;

        let rows: Vec<BrandRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AtelierResult<Brand> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('brand', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BrandRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateBrand) -> AtelierResult<Brand> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('brand', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }

        let result = builder
            .await
            .map_err(|e| DbError::from_statement("brand", e))?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("brand", e))?;

        let rows: Vec<BrandRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> AtelierResult<()> {
        self.get_by_id(id).await?;

        // Retraction and removal commit together: no profile can observe
        // the brand gone while still listing it.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE profile SET \
                 owned_brands = array::complement(owned_brands, [$id]), \
                 updated_at = time::now() \
                 WHERE owned_brands CONTAINS $id; \
                 DELETE type::record('brand', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(|e| DbError::from_statement("brand", e))?
            .check()
            .map_err(|e| DbError::from_statement("brand", e))?;

        debug!(brand_id = %id, "Brand deleted and retracted from owners");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> AtelierResult<PaginatedResult<Brand>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM brand GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM brand \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BrandRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_brand())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_ids(&self, ids: &BTreeSet<Uuid>) -> AtelierResult<Vec<Brand>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM brand \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY name ASC",
            )
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BrandRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_brand())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
