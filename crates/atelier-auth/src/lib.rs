//! Atelier Auth — credential exchange, profile provisioning, role
//! resolution, brand ownership, and the authorization gate every
//! brand-mutating operation goes through.

pub mod access;
pub mod backend;
pub mod config;
pub mod error;
pub mod exchange;
pub mod gate;
pub mod ownership;
pub mod pkce;
pub mod provision;
pub mod redirect;
pub mod role;
pub mod studio;
pub mod token;

pub use access::{AccessResolver, Principal};
pub use backend::{
    BackendError, BackendSession, HttpBackendConfig, HttpIdentityBackend, IdentityBackend,
};
pub use config::{AuthConfig, LegacyRoleAllowlist};
pub use error::{AuthError, ProvisionError};
pub use exchange::{
    AuthorizationCode, CallbackOutcome, CallbackParams, Credential, CredentialExchanger,
    ExchangeOutput, PasswordPair,
};
pub use gate::{Action, Decision, DenyReason, Visibility};
pub use ownership::OwnershipRegistry;
pub use provision::ProfileProvisioner;
pub use role::{ProfileRoleLookup, RoleResolution, RoleResolver, RoleSource};
pub use studio::{NewBrand, StudioService};
pub use token::SessionValidator;
