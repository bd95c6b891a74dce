//! Environment-driven configuration.
//!
//! The only configuration the core layers depend on is the CI/local mode
//! switch; everything else here (target environment, base URL, per-role
//! credentials) is the ambient setup stage code needs to log in and
//! navigate.

use crate::result::{EnsayoError, EnsayoResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Whether this run is under CI or on a developer machine.
///
/// Gates exactly one behavior in the core: fixed-delay debug pauses are
/// honored locally and are a strict no-op under CI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Continuous integration run
    Ci,
    /// Local developer run
    Local,
}

impl RunMode {
    /// Detect the mode from the conventional `CI` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("CI") {
            Ok(v) if v == "true" || v == "1" => Self::Ci,
            _ => Self::Local,
        }
    }

    /// Whether this is a CI run.
    #[must_use]
    pub const fn is_ci(&self) -> bool {
        matches!(self, Self::Ci)
    }
}

/// Target deployment the suite runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Pre-production deployment
    Staging,
    /// Production deployment
    Live,
}

impl Environment {
    /// Environment variable prefix for this deployment's settings.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Staging => "STAGING",
            Self::Live => "LIVE",
        }
    }
}

/// User roles the suite signs in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Owns and administers groups
    GroupHost,
    /// Regular member
    Member,
}

/// Login credentials for one role.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolved suite configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Target deployment
    pub environment: Environment,
    /// CI/local switch
    pub mode: RunMode,
    /// Base URL of the application under test
    pub base_url: String,
    group_host: Credentials,
    member: Credentials,
}

fn required_var(name: &str) -> EnsayoResult<String> {
    env::var(name).map_err(|_| EnsayoError::Config {
        message: format!("environment variable {name} is not set"),
    })
}

impl EnvConfig {
    /// Load configuration from the environment.
    ///
    /// `ENVIRONMENT` selects `staging` or `live` (default `live`); the
    /// deployment prefix then selects `<PREFIX>_BASE_URL`,
    /// `<PREFIX>_GROUPHOST_USERNAME`/`_PASSWORD` and
    /// `<PREFIX>_USER_USERNAME`/`_PASSWORD`.
    ///
    /// # Errors
    ///
    /// [`EnsayoError::Config`] if a required variable is missing.
    pub fn from_env() -> EnsayoResult<Self> {
        let environment = match env::var("ENVIRONMENT").as_deref() {
            Ok("staging") => Environment::Staging,
            _ => Environment::Live,
        };
        let prefix = environment.prefix();

        Ok(Self {
            environment,
            mode: RunMode::from_env(),
            base_url: required_var(&format!("{prefix}_BASE_URL"))?,
            group_host: Credentials {
                username: required_var(&format!("{prefix}_GROUPHOST_USERNAME"))?,
                password: required_var(&format!("{prefix}_GROUPHOST_PASSWORD"))?,
            },
            member: Credentials {
                username: required_var(&format!("{prefix}_USER_USERNAME"))?,
                password: required_var(&format!("{prefix}_USER_PASSWORD"))?,
            },
        })
    }

    /// Credentials for the given role.
    #[must_use]
    pub const fn credentials_for(&self, role: UserRole) -> &Credentials {
        match role {
            UserRole::GroupHost => &self.group_host,
            UserRole::Member => &self.member,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_run_mode_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("CI", "true");
        assert_eq!(RunMode::from_env(), RunMode::Ci);

        env::set_var("CI", "1");
        assert_eq!(RunMode::from_env(), RunMode::Ci);

        env::set_var("CI", "false");
        assert_eq!(RunMode::from_env(), RunMode::Local);

        env::remove_var("CI");
        assert_eq!(RunMode::from_env(), RunMode::Local);
    }

    #[test]
    fn test_env_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("ENVIRONMENT", "staging");
        env::set_var("STAGING_BASE_URL", "https://staging.example.test");
        env::set_var("STAGING_GROUPHOST_USERNAME", "host@example.test");
        env::set_var("STAGING_GROUPHOST_PASSWORD", "host-secret");
        env::set_var("STAGING_USER_USERNAME", "user@example.test");
        env::set_var("STAGING_USER_PASSWORD", "user-secret");

        let config = EnvConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.base_url, "https://staging.example.test");
        assert_eq!(
            config.credentials_for(UserRole::GroupHost).username,
            "host@example.test"
        );
        assert_eq!(
            config.credentials_for(UserRole::Member).password,
            "user-secret"
        );

        env::remove_var("ENVIRONMENT");
        env::remove_var("STAGING_BASE_URL");
        env::remove_var("STAGING_GROUPHOST_USERNAME");
        env::remove_var("STAGING_GROUPHOST_PASSWORD");
        env::remove_var("STAGING_USER_USERNAME");
        env::remove_var("STAGING_USER_PASSWORD");
    }

    #[test]
    fn test_missing_variable_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("ENVIRONMENT", "staging");
        env::remove_var("STAGING_BASE_URL");

        let err = EnvConfig::from_env().unwrap_err();
        match err {
            EnsayoError::Config { message } => assert!(message.contains("STAGING_BASE_URL")),
            other => panic!("expected Config error, got {other}"),
        }

        env::remove_var("ENVIRONMENT");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "host@example.test".to_string(),
            password: "super-secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("host@example.test"));
        assert!(!debug.contains("super-secret"));
    }
}
