//! Brand management routes. Every handler goes through the studio
//! service, which authorizes before touching the store.

use std::collections::BTreeSet;

use atelier_auth::{IdentityBackend, NewBrand};
use atelier_core::models::brand::{Brand, UpdateBrand};
use atelier_core::repository::Pagination;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::session::CurrentPrincipal;
use crate::state::AppState;

const MAX_PAGE: u64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let defaults = Pagination::default();
        Pagination {
            offset: q.offset.unwrap_or(defaults.offset),
            limit: q.limit.unwrap_or(defaults.limit).min(MAX_PAGE),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize)]
pub struct OwnershipResponse {
    pub profile_id: Uuid,
    pub owned_brands: BTreeSet<Uuid>,
}

pub async fn list<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Brand>>> {
    let page = state
        .studio
        .visible_brands(&principal, query.into())
        .await?;
    Ok(Json(Page {
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

pub async fn create<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(body): Json<NewBrand>,
) -> ApiResult<(StatusCode, Json<Brand>)> {
    let brand = state.studio.create_brand(&principal, body).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn get<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(brand_id): Path<Uuid>,
) -> ApiResult<Json<Brand>> {
    Ok(Json(state.studio.get_brand(&principal, brand_id).await?))
}

pub async fn update<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(brand_id): Path<Uuid>,
    Json(body): Json<UpdateBrand>,
) -> ApiResult<Json<Brand>> {
    Ok(Json(
        state.studio.update_brand(&principal, brand_id, body).await?,
    ))
}

pub async fn delete<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(brand_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.studio.delete_brand(&principal, brand_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_owner<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((brand_id, profile_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OwnershipResponse>> {
    let owned_brands = state
        .studio
        .grant_ownership(&principal, brand_id, profile_id)
        .await?;
    Ok(Json(OwnershipResponse {
        profile_id,
        owned_brands,
    }))
}

pub async fn revoke_owner<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((brand_id, profile_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OwnershipResponse>> {
    let owned_brands = state
        .studio
        .revoke_ownership(&principal, brand_id, profile_id)
        .await?;
    Ok(Json(OwnershipResponse {
        profile_id,
        owned_brands,
    }))
}
