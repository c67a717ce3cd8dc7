//! Provider registration for the Duo authenticator.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::authenticator::Authenticator;
use crate::config::{PROP_AKEY, PROP_APIHOST, PROP_IKEY, PROP_SKEY};
use crate::duo_web::DuoWeb;
use crate::events::{EventSink, TracingEventSink};
use crate::mfa::{DuoMfaAuthenticator, PROVIDER_ID};
use crate::settings::{DuoSettings, SettingsError};

/// How an execution step participates in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
    /// Must succeed.
    Required,
    /// One of the alternatives must succeed.
    Alternative,
    /// Skipped.
    Disabled,
}

/// Input type of a configuration property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Plain text.
    String,
    /// Masked text.
    Password,
}

/// Descriptor of one configurable setting, shown in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigProperty {
    /// Key in the authenticator configuration.
    pub name: &'static str,
    /// Short label.
    pub label: &'static str,
    /// Help text.
    pub help_text: &'static str,
    /// Input type.
    pub property_type: PropertyType,
}

/// Authenticator factory trait.
///
/// Registered with the host once; creates authenticator instances on demand.
#[async_trait]
pub trait AuthenticatorFactory: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &'static str;

    /// Returns the name shown in the flow editor.
    fn display_type(&self) -> &'static str;

    /// Returns the help text shown in the flow editor.
    fn help_text(&self) -> &'static str;

    /// Returns the credential category this step belongs to.
    fn reference_category(&self) -> &'static str;

    /// Returns the requirements an admin may choose.
    fn requirement_choices(&self) -> &'static [Requirement];

    /// Returns whether users may set this step up themselves.
    fn is_user_setup_allowed(&self) -> bool {
        false
    }

    /// Returns the configurable settings.
    fn config_properties(&self) -> Vec<ConfigProperty>;

    /// Creates an authenticator instance.
    async fn create(&self) -> Box<dyn Authenticator>;
}

const REQUIREMENT_CHOICES: &[Requirement] = &[
    Requirement::Required,
    Requirement::Alternative,
    Requirement::Disabled,
];

/// Factory for [`DuoMfaAuthenticator`].
#[derive(Clone)]
pub struct DuoMfaAuthenticatorFactory {
    duo: Arc<dyn DuoWeb>,
    settings: Arc<DuoSettings>,
    events: Arc<dyn EventSink>,
}

impl DuoMfaAuthenticatorFactory {
    /// Creates a factory with default settings and tracing events.
    #[must_use]
    pub fn new(duo: Arc<dyn DuoWeb>) -> Self {
        Self::with_settings(duo, DuoSettings::default(), Arc::new(TracingEventSink))
    }

    /// Creates a factory with settings read from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds invalid settings.
    pub fn from_env(duo: Arc<dyn DuoWeb>) -> Result<Self, SettingsError> {
        let settings = DuoSettings::from_env()?;
        Ok(Self::with_settings(duo, settings, Arc::new(TracingEventSink)))
    }

    /// Creates a factory with explicit settings and event sink.
    #[must_use]
    pub fn with_settings(duo: Arc<dyn DuoWeb>, settings: DuoSettings, events: Arc<dyn EventSink>) -> Self {
        Self {
            duo,
            settings: Arc::new(settings),
            events,
        }
    }
}

impl fmt::Debug for DuoMfaAuthenticatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuoMfaAuthenticatorFactory")
            .field("settings", &self.settings)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthenticatorFactory for DuoMfaAuthenticatorFactory {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn display_type(&self) -> &'static str {
        "Duo MFA"
    }

    fn help_text(&self) -> &'static str {
        "Duo two-factor authentication. Users must be enrolled with Duo under the same username."
    }

    fn reference_category(&self) -> &'static str {
        "mfa"
    }

    fn requirement_choices(&self) -> &'static [Requirement] {
        REQUIREMENT_CHOICES
    }

    fn config_properties(&self) -> Vec<ConfigProperty> {
        vec![
            ConfigProperty {
                name: PROP_IKEY,
                label: "Duo Integration Key",
                help_text: "Integration key of the Duo Web SDK application.",
                property_type: PropertyType::String,
            },
            ConfigProperty {
                name: PROP_SKEY,
                label: "Duo Secret Key",
                help_text: "Secret key of the Duo Web SDK application.",
                property_type: PropertyType::Password,
            },
            ConfigProperty {
                name: PROP_AKEY,
                label: "Duo Application Key",
                help_text: "Secret of your own, at least 40 characters, used to sign the application half of each request.",
                property_type: PropertyType::Password,
            },
            ConfigProperty {
                name: PROP_APIHOST,
                label: "Duo API Hostname",
                help_text: "API hostname of the Duo application, such as api-xxxxxxxx.duosecurity.com.",
                property_type: PropertyType::String,
            },
        ]
    }

    async fn create(&self) -> Box<dyn Authenticator> {
        Box::new(DuoMfaAuthenticator::with_settings(
            self.duo.clone(),
            self.settings.clone(),
            self.events.clone(),
        ))
    }
}
