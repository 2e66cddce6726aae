//! Sign-in, callback, sign-out, and whoami.

use atelier_auth::pkce::PkcePair;
use atelier_auth::redirect::safe_destination;
use atelier_auth::{
    CallbackOutcome, CallbackParams, Credential, IdentityBackend, PasswordPair, Principal,
};
use atelier_core::error::AtelierError;
use atelier_core::models::profile::Profile;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::error::{ApiError, ApiResult};
use crate::session::{
    CurrentPrincipal, PKCE_COOKIE, SESSION_COOKIE, pkce_cookie, removal, session_cookie,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OAuthStartQuery {
    pub next: Option<String>,
}

fn valid_provider(provider: &str) -> bool {
    !provider.is_empty()
        && provider
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Start an OAuth sign-in: stash a PKCE verifier and redirect to the
/// provider via the identity backend.
pub async fn oauth_start<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthStartQuery>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Redirect)> {
    if !valid_provider(&provider) {
        return Err(AtelierError::Validation {
            message: format!("unknown provider '{provider}'"),
        }
        .into());
    }
    let next = safe_destination(
        query.next.as_deref(),
        &state.exchanger.config().default_destination,
    );
    let callback = format!(
        "{}/auth/callback?{}",
        state.public_url,
        form_urlencoded::Serializer::new(String::new())
            .append_pair("state", &next)
            .finish()
    );

    let pkce = PkcePair::generate();
    let url = state
        .exchanger
        .backend()
        .authorize_url(&provider, &callback, &pkce.challenge)
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    debug!(%provider, "Redirecting to OAuth provider");
    let jar = jar.add(pkce_cookie(pkce.verifier, state.secure_cookies));
    Ok((jar, Redirect::to(url.as_str())))
}

/// OAuth callback. Always answers with a redirect: to the validated
/// destination on success, to the login page otherwise.
pub async fn callback<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let verifier = jar.get(PKCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal(PKCE_COOKIE));

    match state
        .exchanger
        .complete_callback(params, verifier.as_deref())
        .await
    {
        CallbackOutcome::SignedIn(out) => (
            jar.add(session_cookie(&out.session, state.secure_cookies)),
            Redirect::to(&out.destination),
        ),
        CallbackOutcome::Failed { redirect, .. } => (jar, Redirect::to(&redirect)),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub profile: Profile,
    pub destination: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn login<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let credential = Credential::Password(PasswordPair {
        email: body.email,
        password: body.password,
    });
    let out = state
        .exchanger
        .exchange(credential, body.next.as_deref())
        .await?;

    let jar = jar.add(session_cookie(&out.session, state.secure_cookies));
    Ok((
        jar,
        Json(LoginResponse {
            profile: out.profile,
            destination: out.destination,
            expires_at: out.session.expires_at,
        }),
    ))
}

/// Sign out. The cookie is cleared even when the session is already
/// invalid or the backend cannot be reached.
pub async fn logout<B: IdentityBackend + 'static>(
    State(state): State<AppState<B>>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    if let Ok(session) = state.access.validator().validate(token.as_deref()) {
        state.exchanger.sign_out(&session).await;
    }
    (jar.remove(removal(SESSION_COOKIE)), StatusCode::NO_CONTENT)
}

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_are_restricted() {
        assert!(valid_provider("google"));
        assert!(valid_provider("azure_ad"));
        assert!(!valid_provider(""));
        assert!(!valid_provider("goo gle"));
        assert!(!valid_provider("../evil"));
    }
}
