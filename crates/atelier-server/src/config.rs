//! Server configuration.
//!
//! Loaded from a YAML file, then overridden by `ATELIER_`-prefixed
//! environment variables with `__` separating nested keys, e.g.
//! `ATELIER_AUTH__SESSION_JWT_SECRET`.

use atelier_auth::{AuthConfig, HttpBackendConfig};
use atelier_db::DbConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible origin, used to build the OAuth callback URL.
    pub public_url: String,
    /// Mark cookies `Secure`. Disable only for plain-HTTP local development.
    pub secure_cookies: bool,
    pub database: DbConfig,
    pub auth: AuthConfig,
    pub identity_backend: HttpBackendConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            public_url: "http://localhost:3000".into(),
            secure_cookies: true,
            database: DbConfig::default(),
            auth: AuthConfig::default(),
            identity_backend: HttpBackendConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("ATELIER_").split("__"))
    }

    pub fn load(path: &str) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.auth.session_jwt_secret.is_empty() {
            return Err("auth.session_jwt_secret must be set".to_string().into());
        }
        if !self.auth.default_destination.starts_with('/') {
            return Err("auth.default_destination must be a relative path"
                .to_string()
                .into());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::models::role::Role;
    use figment::Jail;

    #[test]
    fn loads_yaml_with_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "atelier.yaml",
                r#"
port: 8080
auth:
  session_jwt_secret: from-file
  legacy_roles:
    super_admins: ["Founder@Atelier.io"]
    brand_admins: ["buyer@atelier.io"]
database:
  url: "mem://"
"#,
            )?;

            let config = ServerConfig::load("atelier.yaml")?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.database.url, "mem://");
            assert_eq!(config.database.namespace, "atelier");
            assert_eq!(config.auth.backend_timeout_secs, 10);
            assert_eq!(config.auth.default_destination, "/studio");
            assert_eq!(
                config.auth.legacy_roles.role_for("founder@atelier.io"),
                Some(Role::SuperAdmin)
            );
            assert_eq!(
                config.auth.legacy_roles.role_for("buyer@atelier.io"),
                Some(Role::BrandAdmin)
            );
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("atelier.yaml", "auth:\n  session_jwt_secret: from-file\n")?;
            jail.set_env("ATELIER_PORT", "9090");
            jail.set_env("ATELIER_AUTH__SESSION_JWT_SECRET", "from-env");
            jail.set_env("ATELIER_AUTH__BACKEND_TIMEOUT_SECS", "3");
            jail.set_env("ATELIER_IDENTITY_BACKEND__API_KEY", "anon");

            let config = ServerConfig::load("atelier.yaml")?;
            assert_eq!(config.port, 9090);
            assert_eq!(config.auth.session_jwt_secret, "from-env");
            assert_eq!(config.auth.backend_timeout_secs, 3);
            assert_eq!(config.identity_backend.api_key, "anon");
            assert_eq!(config.bind_address(), "0.0.0.0:9090");
            Ok(())
        });
    }

    #[test]
    fn missing_secret_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("atelier.yaml", "port: 8080\n")?;
            assert!(ServerConfig::load("atelier.yaml").is_err());
            Ok(())
        });
    }
}
