//! Authentication configuration.

use std::collections::HashSet;
use std::sync::Arc;

use atelier_core::models::role::Role;
use serde::Deserialize;

/// Configuration for the authentication core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret the identity backend signs session tokens with.
    pub session_jwt_secret: String,
    /// Expected `aud` claim, if the backend sets one (e.g. `authenticated`).
    pub session_audience: Option<String>,
    /// Upper bound on any single identity-backend call (default: 10 seconds).
    pub backend_timeout_secs: u64,
    /// Where to send a user after sign-in when no valid destination was given.
    pub default_destination: String,
    /// Login page that receives `error` and `message` after a failed exchange.
    pub login_path: String,
    /// Compatibility fallback for roles that predate the profile table.
    pub legacy_roles: LegacyRoleAllowlist,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_jwt_secret: String::new(),
            session_audience: None,
            backend_timeout_secs: 10,
            default_destination: "/studio".into(),
            login_path: "/login".into(),
            legacy_roles: LegacyRoleAllowlist::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAllowlist {
    super_admins: Vec<String>,
    brand_admins: Vec<String>,
}

/// Static email → role mapping kept for identities onboarded before the
/// profile table carried roles.
///
/// Loaded once from configuration and immutable afterwards. Emails are
/// compared trimmed and lowercased. Deprecated: once every listed
/// identity has been promoted in the database, both lists can be emptied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawAllowlist")]
pub struct LegacyRoleAllowlist {
    inner: Arc<Lists>,
}

#[derive(Debug, Default)]
struct Lists {
    super_admins: HashSet<String>,
    brand_admins: HashSet<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl From<RawAllowlist> for LegacyRoleAllowlist {
    fn from(raw: RawAllowlist) -> Self {
        Self::new(raw.super_admins, raw.brand_admins)
    }
}

impl LegacyRoleAllowlist {
    pub fn new<S, B>(super_admins: S, brand_admins: B) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            inner: Arc::new(Lists {
                super_admins: super_admins
                    .into_iter()
                    .map(|e| normalize(e.as_ref()))
                    .collect(),
                brand_admins: brand_admins
                    .into_iter()
                    .map(|e| normalize(e.as_ref()))
                    .collect(),
            }),
        }
    }

    /// The allowlisted role for `email`. The super-admin list wins when an
    /// address appears on both.
    pub fn role_for(&self, email: &str) -> Option<Role> {
        let email = normalize(email);
        if self.inner.super_admins.contains(&email) {
            Some(Role::SuperAdmin)
        } else if self.inner.brand_admins.contains(&email) {
            Some(Role::BrandAdmin)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.super_admins.is_empty() && self.inner.brand_admins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let list = LegacyRoleAllowlist::new(["Root@Atelier.io "], ["buyer@atelier.io"]);
        assert_eq!(list.role_for("root@atelier.io"), Some(Role::SuperAdmin));
        assert_eq!(list.role_for(" BUYER@atelier.io"), Some(Role::BrandAdmin));
        assert_eq!(list.role_for("nobody@atelier.io"), None);
    }

    #[test]
    fn super_admin_wins_over_brand_admin() {
        let list = LegacyRoleAllowlist::new(["both@atelier.io"], ["both@atelier.io"]);
        assert_eq!(list.role_for("both@atelier.io"), Some(Role::SuperAdmin));
    }

    #[test]
    fn deserializes_from_lists() {
        let list: LegacyRoleAllowlist = serde_json::from_str(
            r#"{"super_admins": ["A@x.io"], "brand_admins": []}"#,
        )
        .unwrap();
        assert_eq!(list.role_for("a@x.io"), Some(Role::SuperAdmin));
        assert!(!list.is_empty());
        assert!(LegacyRoleAllowlist::default().is_empty());
    }
}
