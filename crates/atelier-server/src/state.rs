//! Shared application state.

use std::ops::Deref;
use std::sync::Arc;

use atelier_auth::{
    AccessResolver, CredentialExchanger, IdentityBackend, ProfileProvisioner, RoleResolver,
    SessionValidator, StudioService,
};
use atelier_db::repository::{SurrealBrandRepository, SurrealProfileRepository};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::config::ServerConfig;

pub type Profiles = SurrealProfileRepository<Any>;
pub type Brands = SurrealBrandRepository<Any>;

pub struct StateInner<B> {
    pub exchanger: CredentialExchanger<B, Profiles>,
    pub access: AccessResolver<Profiles>,
    pub studio: StudioService<Profiles, Brands>,
    pub public_url: String,
    pub secure_cookies: bool,
}

/// Cheap-to-clone handle passed to every handler.
pub struct AppState<B> {
    inner: Arc<StateInner<B>>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> Deref for AppState<B> {
    type Target = StateInner<B>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<B: IdentityBackend> AppState<B> {
    pub fn new(db: Surreal<Any>, backend: B, config: &ServerConfig) -> Self {
        let profiles = SurrealProfileRepository::new(db.clone());
        let brands = SurrealBrandRepository::new(db);

        let exchanger = CredentialExchanger::new(
            backend,
            ProfileProvisioner::new(profiles.clone()),
            config.auth.clone(),
        );
        let access = AccessResolver::new(
            profiles.clone(),
            RoleResolver::new(config.auth.legacy_roles.clone()),
            SessionValidator::new(&config.auth),
        );

        Self {
            inner: Arc::new(StateInner {
                exchanger,
                access,
                studio: StudioService::new(profiles, brands),
                public_url: config.public_url.trim_end_matches('/').to_string(),
                secure_cookies: config.secure_cookies,
            }),
        }
    }
}
