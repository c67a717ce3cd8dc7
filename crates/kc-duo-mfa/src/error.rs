//! Duo MFA error types.
//!
//! User-facing text is always one of the fixed messages below. Details
//! (which field failed, what the primitive reported) stay in server logs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::duo_web::{DuoWebError, SigningError};

/// Message shown when the realm's Duo configuration is unusable.
pub const MSG_CONFIG_ERROR: &str = "Duo MFA configuration error.";
/// Message shown when the challenge could not be signed.
pub const MSG_SIGNING_FAILED: &str = "Duo signRequest failed.";
/// Message shown when the browser posted back without a response.
pub const MSG_MISSING_RESPONSE: &str = "Missing sig_response from Duo.";
/// Message shown when the signed response did not verify.
pub const MSG_VERIFICATION_FAILED: &str = "Duo verification failed.";
/// Message shown when Duo vouched for a different user.
pub const MSG_IDENTITY_MISMATCH: &str = "Duo authentication mismatch.";

/// Errors in the contract between the host flow engine and an authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The host invoked the step without the state it requires.
    #[error("invalid authentication state")]
    InvalidState,
    /// Internal error.
    #[error("internal authentication error: {0}")]
    Internal(String),
}

/// Result type for authenticator operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Error code attached to a failure challenge reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthFlowError {
    /// The second factor was not proven.
    InvalidCredentials,
    /// The step cannot run at all.
    InternalError,
}

impl AuthFlowError {
    /// Returns the wire name of the error.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Everything that can go wrong during one Duo attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuoError {
    /// Realm configuration is missing or malformed.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Duo refused to sign the challenge.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The form post carried no `sig_response`.
    #[error("missing sig_response from Duo")]
    MissingResponse,

    /// The signed response failed verification.
    #[error("Duo verification failed: {0}")]
    Verification(#[from] DuoWebError),

    /// Duo verified a user other than the one logging in.
    #[error("Duo returned mismatched username")]
    IdentityMismatch {
        /// User the host is authenticating.
        expected: String,
        /// User embedded in the verified response.
        actual: Option<String>,
    },
}

impl DuoError {
    /// Returns the flow error reported to the host for this failure.
    #[must_use]
    pub const fn flow_error(&self) -> AuthFlowError {
        match self {
            Self::Configuration(_) => AuthFlowError::InternalError,
            _ => AuthFlowError::InvalidCredentials,
        }
    }

    /// Returns the generic message rendered to the end user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => MSG_CONFIG_ERROR,
            Self::Signing(_) => MSG_SIGNING_FAILED,
            Self::MissingResponse => MSG_MISSING_RESPONSE,
            Self::Verification(_) => MSG_VERIFICATION_FAILED,
            Self::IdentityMismatch { .. } => MSG_IDENTITY_MISMATCH,
        }
    }

    /// Returns a stable code for audit events.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "duo_config_invalid",
            Self::Signing(_) => "duo_sign_failed",
            Self::MissingResponse => "duo_missing_response",
            Self::Verification(_) => "duo_verification_failed",
            Self::IdentityMismatch { .. } => "duo_identity_mismatch",
        }
    }

    /// Whether the user may retry with a fresh challenge.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingResponse | Self::Verification(_) | Self::IdentityMismatch { .. }
        )
    }
}
