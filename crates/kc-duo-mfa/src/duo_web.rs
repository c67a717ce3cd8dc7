//! Boundary to the Duo Web signing primitive.
//!
//! The primitive itself (Duo's `sign_request` / `verify_response`) is
//! supplied by the deployment through [`DuoWeb`]. Its signing call reports
//! failure through an `ERR`-prefixed string; [`SigningService`] turns that
//! into a typed [`SigningError`] before anything else sees it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ProviderCredentials;

/// Prefix the signing primitive uses to report a failure.
pub const SIGNING_ERROR_PREFIX: &str = "ERR";

/// The Duo Web signing primitive.
///
/// Implementations are synchronous, in-process computations.
pub trait DuoWeb: Send + Sync {
    /// Signs a challenge for `username`.
    ///
    /// Never fails outright: on error the returned string starts with
    /// [`SIGNING_ERROR_PREFIX`].
    fn sign_request(&self, ikey: &str, skey: &str, akey: &str, username: &str) -> String;

    /// Verifies a signed response and returns the username it vouches for.
    ///
    /// # Errors
    ///
    /// Returns [`DuoWebError`] for malformed, forged or expired responses.
    fn verify_response(
        &self,
        ikey: &str,
        skey: &str,
        akey: &str,
        sig_response: &str,
    ) -> Result<Option<String>, DuoWebError>;
}

/// Verification failures reported by the primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuoWebError {
    /// Response could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Signature did not match.
    #[error("signature mismatch")]
    SignatureMismatch,
    /// Response expired.
    #[error("response expired")]
    Expired,
    /// Underlying cryptographic failure.
    #[error("algorithm error: {0}")]
    Algorithm(String),
}

/// The signing primitive rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Duo signRequest failed: {sentinel}")]
pub struct SigningError {
    sentinel: String,
}

impl SigningError {
    /// The raw value returned by the primitive.
    #[must_use]
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }
}

/// A signed challenge, ready to embed in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest(String);

impl SignedRequest {
    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed adapter over a [`DuoWeb`] implementation.
#[derive(Clone)]
pub struct SigningService {
    duo: Arc<dyn DuoWeb>,
}

impl SigningService {
    /// Wraps a primitive.
    #[must_use]
    pub fn new(duo: Arc<dyn DuoWeb>) -> Self {
        Self { duo }
    }

    /// Signs a challenge for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when the primitive answers with its error
    /// sentinel.
    pub fn sign(
        &self,
        credentials: &ProviderCredentials,
        username: &str,
    ) -> Result<SignedRequest, SigningError> {
        let signed = self.duo.sign_request(
            credentials.integration_key(),
            credentials.secret_key(),
            credentials.application_secret_key(),
            username,
        );

        if signed.starts_with(SIGNING_ERROR_PREFIX) {
            return Err(SigningError { sentinel: signed });
        }
        Ok(SignedRequest(signed))
    }

    /// Verifies a signed response.
    ///
    /// # Errors
    ///
    /// Propagates the primitive's [`DuoWebError`].
    pub fn verify(
        &self,
        credentials: &ProviderCredentials,
        sig_response: &str,
    ) -> Result<Option<String>, DuoWebError> {
        self.duo.verify_response(
            credentials.integration_key(),
            credentials.secret_key(),
            credentials.application_secret_key(),
            sig_response,
        )
    }
}

impl fmt::Debug for SigningService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningService").finish_non_exhaustive()
    }
}
