//! Session token verification.
//!
//! The identity backend signs session tokens with a shared HS256 secret.
//! Atelier never issues tokens; it only checks that a presented one is
//! authentic and unexpired before trusting its subject.

use atelier_core::models::session::Session;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims Atelier reads from a backend session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies session tokens against the configured secret.
#[derive(Clone)]
pub struct SessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl SessionValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);
        match &config.session_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(config.session_jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Turn a presented bearer token into a [`Session`].
    ///
    /// A missing, malformed, forged, or expired token is `Unauthenticated`.
    pub fn validate(&self, token: Option<&str>) -> Result<Session, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        let claims = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                AuthError::Unauthenticated
            })?;

        let identity_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthenticated)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::Unauthenticated)?;
        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0).unwrap_or(expires_at);

        let session = Session {
            token: token.to_string(),
            identity_id,
            email: claims.email.unwrap_or_default(),
            issued_at,
            expires_at,
        };
        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::Unauthenticated);
        }
        Ok(session)
    }
}
