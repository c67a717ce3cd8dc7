//! Per-realm Duo configuration.
//!
//! The host injects an [`AuthenticatorConfig`] into every invocation. The
//! four Duo settings are read from it fresh each time, trimmed, and checked
//! by [`ConfigValidator`] before any challenge is signed.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Config key for the Duo integration key.
pub const PROP_IKEY: &str = "duo.ikey";
/// Config key for the Duo secret key.
pub const PROP_SKEY: &str = "duo.skey";
/// Config key for the application secret key.
pub const PROP_AKEY: &str = "duo.akey";
/// Config key for the Duo API hostname.
pub const PROP_APIHOST: &str = "duo.apihost";

/// Minimum length of the application secret key.
pub const MIN_AKEY_LENGTH: usize = 40;

static API_HOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").expect("API host pattern is valid"));

/// Authenticator configuration stored per realm.
///
/// Read-only to the authenticator; administrators edit it through the host.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthenticatorConfig {
    /// Configuration ID.
    pub id: Uuid,
    /// Alias shown in the admin console.
    pub alias: String,
    /// Raw key/value settings.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl AuthenticatorConfig {
    /// Creates an empty configuration with the given alias.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            alias: alias.into(),
            config: HashMap::new(),
        }
    }

    /// Sets a configuration value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Gets a configuration value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }
}

// Values may hold Duo secrets, so only keys are printed.
impl fmt::Debug for AuthenticatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.config.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("AuthenticatorConfig")
            .field("id", &self.id)
            .field("alias", &self.alias)
            .field("keys", &keys)
            .finish()
    }
}

/// Reasons the Duo configuration is rejected.
///
/// Variants name the offending setting but never carry its value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `duo.ikey` is missing or blank.
    #[error("Duo integration key is missing")]
    MissingIntegrationKey,

    /// `duo.skey` is missing or blank.
    #[error("Duo secret key is missing")]
    MissingSecretKey,

    /// `duo.akey` is shorter than the minimum.
    #[error("Duo application secret key must be at least {min} characters")]
    ApplicationKeyTooShort {
        /// Required minimum length.
        min: usize,
    },

    /// `duo.apihost` is not a plain hostname.
    #[error("Duo API host is not a valid hostname")]
    InvalidApiHost,
}

/// The four Duo settings for one realm.
#[derive(Debug)]
pub struct ProviderCredentials {
    integration_key: String,
    secret_key: SecretString,
    application_secret_key: SecretString,
    api_host: String,
}

impl ProviderCredentials {
    /// Creates credentials from raw values, trimming each one.
    #[must_use]
    pub fn new(
        integration_key: &str,
        secret_key: &str,
        application_secret_key: &str,
        api_host: &str,
    ) -> Self {
        Self {
            integration_key: integration_key.trim().to_string(),
            secret_key: SecretString::from(secret_key.trim().to_string()),
            application_secret_key: SecretString::from(application_secret_key.trim().to_string()),
            api_host: api_host.trim().to_string(),
        }
    }

    /// Reads credentials from the realm configuration.
    ///
    /// Absent settings (or an absent configuration) read as empty strings.
    #[must_use]
    pub fn from_config(config: Option<&AuthenticatorConfig>) -> Self {
        Self::new(
            config_value(config, PROP_IKEY),
            config_value(config, PROP_SKEY),
            config_value(config, PROP_AKEY),
            config_value(config, PROP_APIHOST),
        )
    }

    /// Reads and validates credentials from the realm configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by [`ConfigValidator`].
    pub fn load(config: Option<&AuthenticatorConfig>) -> Result<Self, ConfigError> {
        let credentials = Self::from_config(config);
        ConfigValidator::validate(&credentials)?;
        Ok(credentials)
    }

    /// Duo integration key.
    #[must_use]
    pub fn integration_key(&self) -> &str {
        &self.integration_key
    }

    /// Duo secret key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Application secret key.
    #[must_use]
    pub fn application_secret_key(&self) -> &str {
        self.application_secret_key.expose_secret()
    }

    /// Duo API hostname.
    #[must_use]
    pub fn api_host(&self) -> &str {
        &self.api_host
    }
}

fn config_value<'a>(config: Option<&'a AuthenticatorConfig>, key: &str) -> &'a str {
    config.and_then(|c| c.get(key)).unwrap_or_default()
}

/// Validates Duo credentials before use.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Checks every rule; all must hold.
    ///
    /// # Errors
    ///
    /// Returns the first rule that does not hold.
    pub fn validate(credentials: &ProviderCredentials) -> Result<(), ConfigError> {
        if credentials.integration_key().is_empty() {
            return Err(ConfigError::MissingIntegrationKey);
        }
        if credentials.secret_key().is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }
        if credentials.application_secret_key().chars().count() < MIN_AKEY_LENGTH {
            return Err(ConfigError::ApplicationKeyTooShort {
                min: MIN_AKEY_LENGTH,
            });
        }
        if !API_HOST_PATTERN.is_match(credentials.api_host()) {
            return Err(ConfigError::InvalidApiHost);
        }
        Ok(())
    }

    /// Returns whether the credentials pass validation.
    #[must_use]
    pub fn is_valid(credentials: &ProviderCredentials) -> bool {
        Self::validate(credentials).is_ok()
    }
}
