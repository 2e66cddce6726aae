//! Authentication and authorization error types.

use atelier_core::error::AtelierError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Password pair rejected. Never says whether the email exists.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity provider error: {description}")]
    ProviderError { description: String },

    #[error("identity provider returned no session")]
    NoSessionIssued,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("not an owner of the requested brand")]
    NotOwner,

    #[error("role does not permit this action")]
    InsufficientRole,

    #[error("profile unavailable: {0}")]
    ProfileUnavailable(String),
}

impl AuthError {
    /// Machine-readable code carried in the login redirect's `error`
    /// parameter.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ProviderError { .. } => "provider_error",
            AuthError::NoSessionIssued => "no_session",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::NotOwner => "not_owner",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::ProfileUnavailable(_) => "profile_unavailable",
        }
    }

    /// Human-readable text for the login redirect's `message` parameter.
    /// Provider descriptions are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::ProviderError { description } => description.clone(),
            AuthError::NoSessionIssued => "Sign-in did not complete. Please try again.".into(),
            AuthError::ProfileUnavailable(_) => {
                "Your account could not be loaded. Please try again.".into()
            }
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for AtelierError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::ProviderError { .. }
            | AuthError::NoSessionIssued
            | AuthError::Unauthenticated => AtelierError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::NotOwner | AuthError::InsufficientRole => {
                AtelierError::AuthorizationDenied {
                    reason: err.to_string(),
                }
            }
            AuthError::ProfileUnavailable(msg) => AtelierError::Database(msg),
        }
    }
}

/// Failure to guarantee a profile row for an identity.
///
/// Insert conflicts are not represented here: the provisioner resolves
/// them by re-reading the winning row.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("profile store error: {0}")]
    Store(#[from] AtelierError),

    #[error("profile {id} still missing after conflicting inserts")]
    Unresolved { id: Uuid },
}
