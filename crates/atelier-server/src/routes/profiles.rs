//! Administrative profile routes.

use atelier_auth::IdentityBackend;
use atelier_core::models::profile::Profile;
use atelier_core::models::role::Role;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::session::CurrentPrincipal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

pub async fn set_role<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(profile_id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(
        state
            .studio
            .set_role(&principal, profile_id, body.role)
            .await?,
    ))
}

pub async fn delete<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.studio.delete_profile(&principal, profile_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
