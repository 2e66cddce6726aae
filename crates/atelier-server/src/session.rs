//! Session transport: the session cookie and the principal extractor.

use atelier_auth::{IdentityBackend, Principal};
use atelier_core::models::session::Session;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "atelier_session";
pub const PKCE_COOKIE: &str = "atelier_pkce";

/// Lifetime of the PKCE verifier cookie between authorize and callback.
const PKCE_COOKIE_SECS: i64 = 5 * 60;

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie carrying the bearer token, expiring with the session.
pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(SESSION_COOKIE, session.token.clone(), secure);
    cookie.set_max_age(time::Duration::seconds(session.remaining_secs(Utc::now())));
    cookie
}

pub fn pkce_cookie(verifier: String, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(PKCE_COOKIE, verifier, secure);
    cookie.set_max_age(time::Duration::seconds(PKCE_COOKIE_SECS));
    cookie
}

/// Removal cookie for `name`; path must match the one it was set with.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Bearer token from the `Authorization` header, else the session cookie.
pub fn bearer_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    from_header.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// The resolved caller. Rejects with 401 when the session is missing,
/// invalid, expired, or has no resolvable profile.
pub struct CurrentPrincipal(pub Principal);

impl<B> FromRequestParts<AppState<B>> for CurrentPrincipal
where
    B: IdentityBackend + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);
        let principal = state.access.principal_for_token(token.as_deref()).await?;
        Ok(CurrentPrincipal(principal))
    }
}
