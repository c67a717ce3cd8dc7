//! Duo challenge issuance and response verification.

use std::sync::Arc;

use crate::config::ProviderCredentials;
use crate::duo_web::{DuoWeb, SigningService};
use crate::error::DuoError;
use crate::flow::{states, DuoFlow};
use crate::form::{ChallengeForm, FormInputs};
use crate::settings::DuoSettings;

/// Terminal state reached by [`ChallengeController::resume_and_verify`].
#[derive(Debug)]
pub enum Resolution {
    /// Duo vouched for the expected user.
    Verified(DuoFlow<states::Verified>),
    /// The response was missing, invalid or for someone else.
    Rejected(DuoFlow<states::Rejected>),
    /// The user cancelled.
    Cancelled(DuoFlow<states::Cancelled>),
}

impl Resolution {
    /// Checks if the attempt was verified.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Checks if the attempt was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Checks if the attempt was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Drives one Duo attempt through its states.
///
/// Holds no per-attempt state: credentials, the expected user and the form
/// inputs are passed in on every call.
#[derive(Debug, Clone)]
pub struct ChallengeController {
    signer: SigningService,
    settings: Arc<DuoSettings>,
}

impl ChallengeController {
    /// Creates a controller over a signing primitive.
    #[must_use]
    pub fn new(duo: Arc<dyn DuoWeb>, settings: Arc<DuoSettings>) -> Self {
        Self {
            signer: SigningService::new(duo),
            settings,
        }
    }

    /// Issues the first challenge of an attempt.
    #[must_use]
    pub fn begin(
        &self,
        credentials: &ProviderCredentials,
        flow: DuoFlow<states::Start>,
    ) -> (DuoFlow<states::ChallengeIssued>, ChallengeForm) {
        let form = self.issue_challenge(credentials, flow.expected_username());
        tracing::debug!(
            realm_id = %flow.realm_id,
            username = %flow.expected_username(),
            "Duo challenge issued"
        );
        (flow.challenge_issued(), form)
    }

    /// Signs a fresh challenge for `expected_username` and builds the form.
    ///
    /// When Duo refuses to sign, the form still carries the primitive's
    /// answer so the Duo script can report it, along with a generic error.
    #[must_use]
    pub fn issue_challenge(
        &self,
        credentials: &ProviderCredentials,
        expected_username: &str,
    ) -> ChallengeForm {
        self.render_challenge(credentials, expected_username, None)
    }

    /// Signs a fresh challenge and shows `error` on the form.
    ///
    /// Used after a rejection; the previous token is never reused.
    #[must_use]
    pub fn render_challenge(
        &self,
        credentials: &ProviderCredentials,
        expected_username: &str,
        error: Option<&DuoError>,
    ) -> ChallengeForm {
        let (sig_request, signing_error) = match self.signer.sign(credentials, expected_username) {
            Ok(signed) => (signed.into_inner(), None),
            Err(err) => {
                tracing::error!(
                    username = %expected_username,
                    error = %err,
                    "Duo signRequest failed"
                );
                (err.sentinel().to_string(), Some(DuoError::from(err)))
            }
        };

        let message = error
            .or(signing_error.as_ref())
            .map(|e| e.user_message().to_string());

        ChallengeForm {
            sig_request,
            api_host: credentials.api_host().to_string(),
            scripts: vec![self.settings.script_url.clone()],
            action_url: self.settings.form_action.clone(),
            error: message,
        }
    }

    /// Verifies the browser's answer to an issued challenge.
    ///
    /// Cancellation wins over everything else. Without a `sig_response`
    /// the primitive is never called.
    #[must_use]
    pub fn resume_and_verify(
        &self,
        credentials: &ProviderCredentials,
        flow: DuoFlow<states::ChallengeIssued>,
        inputs: &FormInputs,
    ) -> Resolution {
        if inputs.is_cancelled() {
            tracing::info!(username = %flow.expected_username(), "User cancelled Duo MFA");
            return Resolution::Cancelled(flow.cancelled());
        }

        let Some(sig_response) = inputs.sig_response() else {
            tracing::warn!(username = %flow.expected_username(), "Missing sig_response from Duo");
            return Resolution::Rejected(flow.rejected(DuoError::MissingResponse));
        };

        let verified_username = match self.signer.verify(credentials, sig_response) {
            Ok(username) => username,
            Err(err) => {
                tracing::error!(
                    username = %flow.expected_username(),
                    error = %err,
                    "Duo verification failed"
                );
                return Resolution::Rejected(flow.rejected(err.into()));
            }
        };

        match flow.bind_identity(verified_username) {
            Ok(verified) => {
                tracing::debug!(username = %verified.username(), "Duo authentication succeeded");
                Resolution::Verified(verified)
            }
            Err(rejected) => {
                if let DuoError::IdentityMismatch { expected, actual } = rejected.error() {
                    tracing::warn!(
                        expected = %expected,
                        got = ?actual,
                        "Duo returned mismatched username"
                    );
                }
                Resolution::Rejected(rejected)
            }
        }
    }
}
