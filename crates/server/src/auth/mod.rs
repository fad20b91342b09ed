//! HTTP Basic authentication.
//!
//! Handlers never see credentials; [`middleware::AuthLayer`] asks a
//! [`CredentialChecker`] for a yes/no answer and either forwards the request
//! or answers 401.

pub mod middleware;
pub mod password;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::error::ServerError;

/// Username and password presented by a caller.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Decides whether presented credentials are acceptable.
pub trait CredentialChecker: Send + Sync {
    fn check(&self, credentials: &Credentials) -> bool;
}

#[derive(Debug)]
enum ExpectedPassword {
    Plain(SecretString),
    Hash(SecretString),
}

/// Checks credentials against one configured username and password.
///
/// The password is either held in plain text and compared in constant time,
/// or held as an argon2 hash.
#[derive(Debug)]
pub struct BasicCredentialChecker {
    username: String,
    password: ExpectedPassword,
}

impl BasicCredentialChecker {
    /// Accept `username` with the plain-text `password`.
    pub fn with_password(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password: ExpectedPassword::Plain(password),
        }
    }

    /// Accept `username` with any password matching the argon2 `hash`.
    pub fn with_password_hash(username: impl Into<String>, hash: SecretString) -> Result<Self, ServerError> {
        if !password::is_valid_hash(hash.expose_secret()) {
            return Err(ServerError::Config("auth.password_hash is not a valid argon2 hash".into()));
        }
        Ok(Self {
            username: username.into(),
            password: ExpectedPassword::Hash(hash),
        })
    }

    /// Build a checker from configuration.
    ///
    /// Returns `None` when auth is disabled. A password hash takes precedence
    /// over a plain-text password.
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>, ServerError> {
        if !config.enabled {
            return Ok(None);
        }
        let username = config
            .username
            .clone()
            .ok_or_else(|| ServerError::Config("auth is enabled but auth.username is not set".into()))?;

        if let Some(hash) = &config.password_hash {
            return Self::with_password_hash(username, hash.clone()).map(Some);
        }
        if let Some(password) = &config.password {
            return Ok(Some(Self::with_password(username, password.clone())));
        }
        Err(ServerError::Config(
            "auth is enabled but neither auth.password nor auth.password_hash is set".into(),
        ))
    }
}

impl CredentialChecker for BasicCredentialChecker {
    fn check(&self, credentials: &Credentials) -> bool {
        let username_ok: bool = self
            .username
            .as_bytes()
            .ct_eq(credentials.username.as_bytes())
            .into();

        let candidate = credentials.password.expose_secret();
        let password_ok: bool = match &self.password {
            ExpectedPassword::Plain(expected) => expected
                .expose_secret()
                .as_bytes()
                .ct_eq(candidate.as_bytes())
                .into(),
            ExpectedPassword::Hash(hash) => password::verify_password(hash.expose_secret(), candidate),
        };

        username_ok & password_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_owned())
    }

    #[test]
    fn plain_password_checker() {
        let checker = BasicCredentialChecker::with_password("admin", secret("s3cret"));
        assert!(checker.check(&Credentials::new("admin", "s3cret")));
        assert!(!checker.check(&Credentials::new("admin", "wrong")));
        assert!(!checker.check(&Credentials::new("other", "s3cret")));
        assert!(!checker.check(&Credentials::new("", "")));
    }

    #[test]
    fn hashed_password_checker() {
        let hash = password::hash_for_tests("s3cret");
        let checker = BasicCredentialChecker::with_password_hash("admin", secret(&hash)).unwrap();
        assert!(checker.check(&Credentials::new("admin", "s3cret")));
        assert!(!checker.check(&Credentials::new("admin", "S3cret")));
    }

    #[test]
    fn malformed_hash_is_a_config_error() {
        let result = BasicCredentialChecker::with_password_hash("admin", secret("plaintext"));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn disabled_config_yields_no_checker() {
        let config = AuthConfig::default();
        assert!(BasicCredentialChecker::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn enabled_config_requires_username_and_secret() {
        let mut config = AuthConfig {
            enabled: true,
            ..AuthConfig::default()
        };
        assert!(BasicCredentialChecker::from_config(&config).is_err());

        config.username = Some("admin".into());
        assert!(BasicCredentialChecker::from_config(&config).is_err());

        config.password = Some(secret("pw"));
        let checker = BasicCredentialChecker::from_config(&config).unwrap().unwrap();
        assert!(checker.check(&Credentials::new("admin", "pw")));
    }

    #[test]
    fn env_credentials_alone_produce_a_checker() {
        let mut config = AuthConfig::default();
        config.apply_overrides(Some("admin".into()), Some("s3cret".into()));

        let checker = BasicCredentialChecker::from_config(&config)
            .unwrap()
            .expect("env credentials should enable auth");
        assert!(checker.check(&Credentials::new("admin", "s3cret")));
        assert!(!checker.check(&Credentials::new("admin", "wrong")));
    }

    #[test]
    fn hash_takes_precedence_over_plain_password() {
        let config = AuthConfig {
            enabled: true,
            username: Some("admin".into()),
            password: Some(secret("plain")),
            password_hash: Some(secret(&password::hash_for_tests("hashed"))),
        };
        let checker = BasicCredentialChecker::from_config(&config).unwrap().unwrap();
        assert!(checker.check(&Credentials::new("admin", "hashed")));
        assert!(!checker.check(&Credentials::new("admin", "plain")));
    }
}
