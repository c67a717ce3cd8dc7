//! Crate-wide settings.
//!
//! Loaded from environment variables with sensible defaults. Per-realm Duo
//! keys live in [`crate::config`], not here.

use thiserror::Error;

/// Hosted Duo Web v2 script.
pub const DUO_WEB_SCRIPT_URL: &str = "https://api.duosecurity.com/frame/hosted/Duo-Web-v2.js";

/// Settings loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The script must be served over HTTPS.
    #[error("KC_DUO_SCRIPT_URL must be an https URL: {0}")]
    InsecureScriptUrl(String),
}

/// Duo authenticator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuoSettings {
    /// URL of the Duo client-side script added to the challenge page.
    pub script_url: String,

    /// Form action the challenge page posts to (empty: current URL).
    pub form_action: String,
}

impl DuoSettings {
    /// Loads settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InsecureScriptUrl`] for a non-https script.
    pub fn from_env() -> Result<Self, SettingsError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let script_url = std::env::var("KC_DUO_SCRIPT_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| DUO_WEB_SCRIPT_URL.to_string());

        if !script_url.starts_with("https://") {
            return Err(SettingsError::InsecureScriptUrl(script_url));
        }

        let form_action = std::env::var("KC_DUO_FORM_ACTION")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        Ok(Self {
            script_url,
            form_action,
        })
    }

    /// Sets the form action.
    #[must_use]
    pub fn with_form_action(mut self, action: impl Into<String>) -> Self {
        self.form_action = action.into();
        self
    }
}

impl Default for DuoSettings {
    fn default() -> Self {
        Self {
            script_url: DUO_WEB_SCRIPT_URL.to_string(),
            form_action: String::new(),
        }
    }
}

/// Serializes tests that touch the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Sets (or removes) environment variables for the duration of `f`.
#[cfg(test)]
pub(crate) fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    let result = f();
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}
