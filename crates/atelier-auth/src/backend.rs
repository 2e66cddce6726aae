//! The external identity backend.
//!
//! Password checks, OAuth provider round-trips, and token signing all
//! live in the backend; Atelier only forwards credentials and reads the
//! session it gets back. [`HttpIdentityBackend`] speaks a GoTrue-style
//! REST API (`/token`, `/logout`, `/authorize`).

use std::time::Duration;

use atelier_core::models::identity::Identity;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// A session as reported by the backend, before Atelier binds it.
#[derive(Debug, Clone)]
pub struct BackendSession {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: Identity,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend refused the credentials.
    #[error("credentials rejected")]
    Rejected,

    #[error("{description}")]
    Provider { description: String },

    #[error("identity backend timed out")]
    Timeout,

    #[error("identity backend unreachable: {0}")]
    Transport(String),
}

pub trait IdentityBackend: Send + Sync {
    /// `Ok(None)` means the backend answered successfully but attached no
    /// session.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<BackendSession>, BackendError>> + Send;

    /// Exchange a single-use authorization code. A replayed code must
    /// come back as [`BackendError::Provider`].
    fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> impl Future<Output = Result<Option<BackendSession>, BackendError>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Where to send the browser to start an OAuth sign-in with
    /// `provider`, returning to `redirect_to` afterwards.
    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, BackendError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpIdentityBackend`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpBackendConfig {
    /// Base URL of the auth API, e.g. `https://project.example.co/auth/v1/`.
    pub url: String,
    /// Public API key sent as the `apikey` header.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9999/".into(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn description(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| format!("identity backend returned {status}"))
    }

    fn is_invalid_grant(&self) -> bool {
        self.error.as_deref() == Some("invalid_grant")
            || self.error_code.as_deref() == Some("invalid_credentials")
    }
}

impl TokenResponse {
    fn into_session(self) -> Option<BackendSession> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let user = self.user?;
        let email = user.email?;
        let meta = user.user_metadata;
        Some(BackendSession {
            access_token,
            expires_in: self.expires_in.unwrap_or(3600),
            user: Identity {
                id: user.id,
                email,
                display_name: meta.full_name.or(meta.name),
                avatar_url: meta.avatar_url.or(meta.picture),
            },
        })
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// GoTrue-compatible identity backend over HTTP.
#[derive(Clone)]
pub struct HttpIdentityBackend {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

impl HttpIdentityBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self, BackendError> {
        let mut raw = config.url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|e| BackendError::Transport(format!("invalid backend URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Option<BackendSession>, BackendError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let parsed: TokenResponse = response
                .json()
                .await
                .map_err(|e| BackendError::Transport(format!("malformed token response: {e}")))?;
            return Ok(parsed.into_session());
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        debug!(%status, grant_type, "Identity backend refused token grant");
        let refused = matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED);
        if grant_type == "password" && (refused || body.is_invalid_grant()) {
            return Err(BackendError::Rejected);
        }
        Err(BackendError::Provider {
            description: body.description(status),
        })
    }
}

impl IdentityBackend for HttpIdentityBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<BackendSession>, BackendError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Option<BackendSession>, BackendError> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("logout")?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // An already-invalid token is as signed-out as it gets.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        warn!(%status, "Identity backend sign-out failed");
        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(BackendError::Provider {
            description: body.description(status),
        })
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, BackendError> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HttpIdentityBackend {
        HttpIdentityBackend::new(&HttpBackendConfig {
            url: "https://auth.example.com/auth/v1".into(),
            api_key: "anon".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = backend().endpoint("token").unwrap();
        assert_eq!(url.as_str(), "https://auth.example.com/auth/v1/token");
    }

    #[test]
    fn authorize_url_carries_challenge() {
        let url = backend()
            .authorize_url("google", "https://atelier.example.com/auth/callback", "abc")
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".into(), "google".into())));
        assert!(pairs.contains(&("code_challenge".into(), "abc".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "s256".into())));
    }

    #[test]
    fn token_response_without_user_has_no_session() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token": "tok", "expires_in": 60}"#).unwrap();
        assert!(parsed.into_session().is_none());
    }

    #[test]
    fn token_response_maps_metadata() {
        let id = Uuid::new_v4();
        let parsed: TokenResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "expires_in": 120,
            "user": {
                "id": id,
                "email": "ada@example.com",
                "user_metadata": { "name": "Ada", "picture": "https://img/ada.png" }
            }
        }))
        .unwrap();
        let session = parsed.into_session().unwrap();
        assert_eq!(session.user.id, id);
        assert_eq!(session.user.display_name.as_deref(), Some("Ada"));
        assert_eq!(session.user.avatar_url.as_deref(), Some("https://img/ada.png"));
        assert_eq!(session.expires_in, 120);
    }
}
