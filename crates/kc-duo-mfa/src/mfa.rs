//! The Duo MFA authenticator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::authenticator::{AuthContext, Authenticator, AuthenticatorResult};
use crate::challenge::{ChallengeController, Resolution};
use crate::config::{ConfigError, ProviderCredentials};
use crate::duo_web::DuoWeb;
use crate::error::{AuthError, AuthFlowError, AuthResult, DuoError};
use crate::events::{DuoEvent, EventSink, EventType, TracingEventSink};
use crate::flow::DuoFlow;
use crate::form::{FormInputs, Page};
use crate::settings::DuoSettings;

/// Provider ID of the Duo authenticator.
pub const PROVIDER_ID: &str = "duo-mfa-authenticator";

/// Second-factor step backed by Duo.
///
/// No enrollment happens inside the host: every user is considered
/// configured, and Duo decides whether they can complete the challenge.
#[derive(Debug, Clone)]
pub struct DuoMfaAuthenticator {
    controller: ChallengeController,
    events: Arc<dyn EventSink>,
}

impl DuoMfaAuthenticator {
    /// Creates an authenticator with default settings.
    #[must_use]
    pub fn new(duo: Arc<dyn DuoWeb>) -> Self {
        Self::with_settings(duo, Arc::new(DuoSettings::default()), Arc::new(TracingEventSink))
    }

    /// Creates an authenticator with explicit settings and event sink.
    #[must_use]
    pub fn with_settings(
        duo: Arc<dyn DuoWeb>,
        settings: Arc<DuoSettings>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            controller: ChallengeController::new(duo, settings),
            events,
        }
    }

    fn expected_username(context: &AuthContext) -> AuthResult<&str> {
        context.username().ok_or_else(|| {
            tracing::error!(realm_id = %context.realm_id, "Duo MFA reached without a user");
            AuthError::InvalidState
        })
    }

    fn load_credentials(&self, context: &AuthContext) -> Result<ProviderCredentials, AuthenticatorResult> {
        ProviderCredentials::load(context.authenticator_config.as_deref())
            .map_err(|err| self.config_failure(context, &err))
    }

    fn config_failure(&self, context: &AuthContext, err: &ConfigError) -> AuthenticatorResult {
        tracing::error!(
            realm_id = %context.realm_id,
            reason = %err,
            "Duo MFA configuration is missing or invalid."
        );

        let error = DuoError::from(err.clone());
        let mut event = DuoEvent::builder(EventType::LoginError)
            .realm(context.realm_id)
            .session(context.session_id)
            .failure(error.code());
        if let Some(username) = context.username() {
            event = event.username(username);
        }
        self.events.record(event.build());

        AuthenticatorResult::failure_challenge(
            error.flow_error(),
            Page::internal_error(error.user_message()),
        )
    }

    fn record(&self, context: &AuthContext, username: &str, event_type: EventType) {
        let event = DuoEvent::builder(event_type)
            .realm(context.realm_id)
            .session(context.session_id)
            .username(username)
            .build();
        self.events.record(event);
    }

    fn record_rejection(&self, context: &AuthContext, username: &str, error: &DuoError) {
        let verified_username = match error {
            DuoError::IdentityMismatch { actual, .. } => actual.clone(),
            _ => None,
        };
        let event = DuoEvent::builder(EventType::LoginError)
            .realm(context.realm_id)
            .session(context.session_id)
            .username(username)
            .verified_username(verified_username)
            .failure(error.code())
            .build();
        self.events.record(event);
    }
}

#[async_trait]
impl Authenticator for DuoMfaAuthenticator {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn display_name(&self) -> &'static str {
        "Duo MFA"
    }

    fn requires_user(&self) -> bool {
        false
    }

    fn is_configurable(&self) -> bool {
        true
    }

    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<AuthenticatorResult> {
        let context: &AuthContext = context;

        let credentials = match self.load_credentials(context) {
            Ok(credentials) => credentials,
            Err(result) => return Ok(result),
        };
        let username = Self::expected_username(context)?;

        let flow = DuoFlow::new(context.realm_id, username);
        let (_issued, form) = self.controller.begin(&credentials, flow);

        Ok(AuthenticatorResult::challenge(Page::Challenge(form)))
    }

    async fn action(&self, context: &mut AuthContext) -> AuthResult<AuthenticatorResult> {
        let context: &AuthContext = context;

        let credentials = match self.load_credentials(context) {
            Ok(credentials) => credentials,
            Err(result) => return Ok(result),
        };
        let username = Self::expected_username(context)?;

        let flow = DuoFlow::resume(context.realm_id, username);
        let inputs = FormInputs::from_form_data(&context.form_data);

        let result = match self.controller.resume_and_verify(&credentials, flow, &inputs) {
            Resolution::Cancelled(_) => {
                self.record(context, username, EventType::ResetFlow);
                AuthenticatorResult::flow_reset()
            }
            Resolution::Rejected(rejected) => {
                let error = rejected.into_error();
                self.record_rejection(context, username, &error);

                let form = self
                    .controller
                    .render_challenge(&credentials, username, Some(&error));
                AuthenticatorResult::failure_challenge(AuthFlowError::InvalidCredentials, Page::Challenge(form))
            }
            Resolution::Verified(verified) => {
                self.record(context, verified.username(), EventType::Login);
                AuthenticatorResult::success()
            }
        };

        Ok(result)
    }
}
