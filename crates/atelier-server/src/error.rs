//! HTTP error mapping.

use atelier_auth::AuthError;
use atelier_core::error::AtelierError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Core(#[from] AtelierError),

    #[error("identity backend unavailable: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::NotOwner | AuthError::InsufficientRole => StatusCode::FORBIDDEN,
                AuthError::ProviderError { .. } | AuthError::NoSessionIssued => {
                    StatusCode::BAD_GATEWAY
                }
                AuthError::ProfileUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Core(e) => match e {
                AtelierError::NotFound { .. } => StatusCode::NOT_FOUND,
                AtelierError::AlreadyExists { .. } => StatusCode::CONFLICT,
                AtelierError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
                AtelierError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
                AtelierError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AtelierError::Database(_) | AtelierError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::Core(e) => match e {
                AtelierError::NotFound { .. } => "not_found",
                AtelierError::AlreadyExists { .. } => "already_exists",
                AtelierError::AuthenticationFailed { .. } => "unauthenticated",
                AtelierError::AuthorizationDenied { .. } => "forbidden",
                AtelierError::Validation { .. } => "validation",
                AtelierError::Database(_) | AtelierError::Internal(_) => "internal",
            },
            ApiError::Upstream(_) => "provider_error",
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.user_message(),
            ApiError::Core(AtelierError::Database(_) | AtelierError::Internal(_)) => {
                "Internal server error".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Client error");
        }

        let body = json!({
            "error": self.code(),
            "message": self.user_message(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
