//! Credential exchange: password pairs and OAuth authorization codes in,
//! provisioned sessions out.

use std::fmt;
use std::time::Duration;

use atelier_core::models::profile::Profile;
use atelier_core::models::session::Session;
use atelier_core::repository::ProfileRepository;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::{BackendError, BackendSession, IdentityBackend};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provision::ProfileProvisioner;
use crate::redirect::{login_redirect, safe_destination};

/// Upper bound on a session lifetime reported by the backend.
const MAX_SESSION_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Deserialize)]
pub struct PasswordPair {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for PasswordPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordPair")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    /// PKCE verifier kept by the client since the authorize redirect.
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Credential {
    Password(PasswordPair),
    Code(AuthorizationCode),
}

impl Credential {
    fn method(&self) -> &'static str {
        match self {
            Credential::Password(_) => "password",
            Credential::Code(_) => "oauth_code",
        }
    }
}

/// A completed sign-in.
#[derive(Debug, Clone)]
pub struct ExchangeOutput {
    pub session: Session,
    /// The caller's profile, guaranteed to exist once this is returned.
    pub profile: Profile,
    /// Validated post-sign-in path.
    pub destination: String,
}

/// Query parameters of the OAuth callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Intended destination, already query-decoded.
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug)]
pub enum CallbackOutcome {
    SignedIn(ExchangeOutput),
    /// The callback failed; send the browser to `redirect`.
    Failed { error: AuthError, redirect: String },
}

pub struct CredentialExchanger<B, P> {
    backend: B,
    provisioner: ProfileProvisioner<P>,
    config: AuthConfig,
}

impl<B, P> CredentialExchanger<B, P>
where
    B: IdentityBackend,
    P: ProfileRepository,
{
    pub fn new(backend: B, provisioner: ProfileProvisioner<P>, config: AuthConfig) -> Self {
        Self {
            backend,
            provisioner,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.backend_timeout_secs)
    }

    async fn call_backend(
        &self,
        credential: &Credential,
    ) -> Result<Option<BackendSession>, BackendError> {
        let call = async {
            match credential {
                Credential::Password(pair) => {
                    self.backend
                        .sign_in_with_password(&pair.email, &pair.password)
                        .await
                }
                Credential::Code(code) => {
                    self.backend
                        .exchange_code(&code.code, code.code_verifier.as_deref())
                        .await
                }
            }
        };
        tokio::time::timeout(self.timeout(), call)
            .await
            .unwrap_or(Err(BackendError::Timeout))
    }

    /// Exchange a credential for a session and make sure a profile exists.
    ///
    /// Provisioning runs only after the backend confirms the session, so a
    /// failed or timed-out exchange never writes anything.
    pub async fn exchange(
        &self,
        credential: Credential,
        intended: Option<&str>,
    ) -> Result<ExchangeOutput, AuthError> {
        let method = credential.method();
        let backend_session = match self.call_backend(&credential).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!(method, "Identity backend returned no session");
                return Err(AuthError::NoSessionIssued);
            }
            Err(e) => {
                let err = classify(&credential, e);
                warn!(method, error = %err, "Credential exchange failed");
                return Err(err);
            }
        };

        let now = Utc::now();
        let session = Session {
            token: backend_session.access_token,
            identity_id: backend_session.user.id,
            email: backend_session.user.email.clone(),
            issued_at: now,
            expires_at: now
                + chrono::Duration::seconds(
                    backend_session.expires_in.min(MAX_SESSION_SECS) as i64,
                ),
        };

        let profile = match self.provisioner.ensure(&backend_session.user).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    identity_id = %session.identity_id,
                    error = %e,
                    "Profile provisioning failed after sign-in"
                );
                self.sign_out(&session).await;
                return Err(AuthError::ProfileUnavailable(e.to_string()));
            }
        };

        let destination = safe_destination(intended, &self.config.default_destination);
        info!(
            identity_id = %session.identity_id,
            method,
            role = %profile.role,
            "Signed in"
        );
        Ok(ExchangeOutput {
            session,
            profile,
            destination,
        })
    }

    /// Handle an OAuth callback end to end.
    ///
    /// Provider-reported errors are surfaced without contacting the
    /// backend. Any failure yields a login redirect carrying `error` and
    /// `message`.
    pub async fn complete_callback(
        &self,
        params: CallbackParams,
        code_verifier: Option<&str>,
    ) -> CallbackOutcome {
        if let Some(provider_code) = params.error {
            let description = params
                .error_description
                .unwrap_or_else(|| provider_code.clone());
            warn!(error = %provider_code, %description, "Provider reported sign-in error");
            let redirect = login_redirect(&self.config.login_path, &provider_code, &description);
            return CallbackOutcome::Failed {
                error: AuthError::ProviderError { description },
                redirect,
            };
        }

        let Some(code) = params.code.filter(|c| !c.is_empty()) else {
            return self.failed(AuthError::ProviderError {
                description: "missing authorization code".into(),
            });
        };

        let credential = Credential::Code(AuthorizationCode {
            code,
            code_verifier: code_verifier.map(str::to_string),
        });
        match self.exchange(credential, params.state.as_deref()).await {
            Ok(output) => CallbackOutcome::SignedIn(output),
            Err(error) => self.failed(error),
        }
    }

    fn failed(&self, error: AuthError) -> CallbackOutcome {
        let redirect = login_redirect(&self.config.login_path, error.code(), &error.user_message());
        CallbackOutcome::Failed { error, redirect }
    }

    /// Invalidate the session at the backend. Failures are logged only:
    /// the caller clears its cookie regardless.
    pub async fn sign_out(&self, session: &Session) {
        let call = self.backend.sign_out(&session.token);
        match tokio::time::timeout(self.timeout(), call).await {
            Ok(Ok(())) => info!(identity_id = %session.identity_id, "Signed out"),
            Ok(Err(e)) => {
                warn!(identity_id = %session.identity_id, error = %e, "Backend sign-out failed")
            }
            Err(_) => warn!(identity_id = %session.identity_id, "Backend sign-out timed out"),
        }
    }
}

fn classify(credential: &Credential, err: BackendError) -> AuthError {
    match (credential, err) {
        (Credential::Password(_), BackendError::Rejected) => AuthError::InvalidCredentials,
        (Credential::Code(_), BackendError::Rejected) => AuthError::ProviderError {
            description: "authorization code rejected".into(),
        },
        (_, BackendError::Provider { description }) => AuthError::ProviderError { description },
        (_, other) => AuthError::ProviderError {
            description: other.to_string(),
        },
    }
}
