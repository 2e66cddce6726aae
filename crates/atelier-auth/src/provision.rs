//! First-sight profile provisioning.

use atelier_core::error::AtelierError;
use atelier_core::models::identity::Identity;
use atelier_core::models::profile::{CreateProfile, Profile};
use atelier_core::repository::ProfileRepository;
use tracing::{debug, info};

use crate::error::ProvisionError;

/// How many read/create rounds to attempt before giving up. A lost insert
/// race needs two; the third covers a row deleted between the conflict
/// and the re-read.
const MAX_ATTEMPTS: usize = 3;

/// Guarantees exactly one profile per identity.
#[derive(Clone)]
pub struct ProfileProvisioner<P> {
    profiles: P,
}

impl<P: ProfileRepository> ProfileProvisioner<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    /// Return the identity's profile, creating a default one if absent.
    ///
    /// An existing profile is returned unchanged. When a concurrent call
    /// creates the row first, the insert conflict is absorbed and the
    /// winning row is returned.
    pub async fn ensure(&self, identity: &Identity) -> Result<Profile, ProvisionError> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.profiles.get_by_id(identity.id).await {
                Ok(profile) => return Ok(profile),
                Err(AtelierError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            match self.profiles.create(CreateProfile::from(identity)).await {
                Ok(profile) => {
                    info!(
                        profile_id = %profile.id,
                        email = %profile.email,
                        "Provisioned profile on first sign-in"
                    );
                    return Ok(profile);
                }
                Err(AtelierError::AlreadyExists { .. }) => {
                    debug!(
                        profile_id = %identity.id,
                        attempt,
                        "Lost profile insert race, re-reading"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ProvisionError::Unresolved { id: identity.id })
    }
}
