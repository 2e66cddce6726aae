//! Session domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A bearer credential bound to exactly one identity.
///
/// Only the token itself travels to the client; nothing here is
/// persisted by Atelier.
#[derive(Clone)]
pub struct Session {
    /// Opaque bearer token issued by the identity backend.
    pub token: String,
    pub identity_id: Uuid,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Remaining lifetime in whole seconds, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("identity_id", &self.identity_id)
            .field("email", &self.email)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: i64) -> Session {
        let now = Utc::now();
        Session {
            token: "secret-token".into(),
            identity_id: Uuid::new_v4(),
            email: "a@example.com".into(),
            issued_at: now,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn expiry_is_inclusive() {
        let s = session(0);
        assert!(s.is_expired_at(s.expires_at));
        assert_eq!(s.remaining_secs(s.expires_at + Duration::seconds(5)), 0);
    }

    #[test]
    fn debug_does_not_print_token() {
        let s = session(60);
        assert!(!format!("{s:?}").contains("secret-token"));
    }
}
