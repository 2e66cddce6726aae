//! HTTP routes.

pub mod auth;
pub mod brands;
pub mod profiles;

use atelier_auth::IdentityBackend;
use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router<B: IdentityBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/auth/oauth/{provider}", get(auth::oauth_start::<B>))
        .route("/auth/callback", get(auth::callback::<B>))
        .route("/auth/login", post(auth::login::<B>))
        .route("/auth/logout", post(auth::logout::<B>))
        .route("/auth/me", get(auth::me))
        .route("/brands", get(brands::list::<B>).post(brands::create::<B>))
        .route(
            "/brands/{id}",
            get(brands::get::<B>)
                .patch(brands::update::<B>)
                .delete(brands::delete::<B>),
        )
        .route(
            "/brands/{id}/owners/{profile_id}",
            put(brands::grant_owner::<B>).delete(brands::revoke_owner::<B>),
        )
        .route("/profiles/{id}/role", put(profiles::set_role::<B>))
        .route("/profiles/{id}", axum::routing::delete(profiles::delete::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
