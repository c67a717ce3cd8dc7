//! Duo attempt state machine.
//!
//! Type-safe states for one Duo attempt. The host carries the attempt
//! across the browser round-trip; on resume the flow is rebuilt in the
//! [`states::ChallengeIssued`] state from what the host re-supplies.

use std::fmt;

use uuid::Uuid;

use crate::error::DuoError;

/// Duo attempt states.
pub mod states {
    use crate::error::DuoError;

    /// Initial state - nothing sent to Duo yet.
    #[derive(Debug, Clone, Copy)]
    pub struct Start;

    /// Challenged state - signed request rendered, waiting for the browser.
    #[derive(Debug, Clone, Copy)]
    pub struct ChallengeIssued;

    /// Verified state - Duo vouched for the expected user.
    #[derive(Debug, Clone)]
    pub struct Verified {
        pub(crate) username: String,
    }

    /// Rejected state - the response was missing, invalid or mismatched.
    #[derive(Debug, Clone)]
    pub struct Rejected {
        pub(crate) error: DuoError,
    }

    /// Cancelled state - the user abandoned the second factor.
    #[derive(Debug, Clone, Copy)]
    pub struct Cancelled;
}

/// Why a response was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No `sig_response` in the form post.
    MissingResponse,
    /// The primitive refused the response.
    VerificationFailed,
    /// Duo vouched for somebody else.
    IdentityMismatch,
}

impl RejectionReason {
    /// Returns the reason as text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingResponse => "missing response",
            Self::VerificationFailed => "verification failed",
            Self::IdentityMismatch => "identity mismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Duo attempt.
///
/// The generic parameter `S` is the current state. Terminal states carry
/// their outcome, so a verified flow always has a username and a rejected
/// flow always has an error.
#[derive(Debug)]
pub struct DuoFlow<S> {
    /// Realm ID.
    pub realm_id: Uuid,
    /// User the host is authenticating.
    expected_username: String,
    /// State data.
    state: S,
}

impl<S> DuoFlow<S> {
    /// Gets the user the host is authenticating.
    #[must_use]
    pub fn expected_username(&self) -> &str {
        &self.expected_username
    }

    fn transition<T>(self, state: T) -> DuoFlow<T> {
        DuoFlow {
            realm_id: self.realm_id,
            expected_username: self.expected_username,
            state,
        }
    }
}

impl DuoFlow<states::Start> {
    /// Starts a Duo attempt for `expected_username`.
    #[must_use]
    pub fn new(realm_id: Uuid, expected_username: impl Into<String>) -> Self {
        Self {
            realm_id,
            expected_username: expected_username.into(),
            state: states::Start,
        }
    }

    /// A challenge has been rendered.
    #[must_use]
    pub fn challenge_issued(self) -> DuoFlow<states::ChallengeIssued> {
        self.transition(states::ChallengeIssued)
    }
}

impl DuoFlow<states::ChallengeIssued> {
    /// Rebuilds an issued challenge when the browser posts back.
    #[must_use]
    pub fn resume(realm_id: Uuid, expected_username: impl Into<String>) -> Self {
        DuoFlow::new(realm_id, expected_username).challenge_issued()
    }

    /// The user cancelled.
    #[must_use]
    pub fn cancelled(self) -> DuoFlow<states::Cancelled> {
        self.transition(states::Cancelled)
    }

    /// The response was rejected.
    #[must_use]
    pub fn rejected(self, error: DuoError) -> DuoFlow<states::Rejected> {
        self.transition(states::Rejected { error })
    }

    /// Binds the username Duo verified to the expected user.
    ///
    /// Exact, case-sensitive comparison; an absent username never matches.
    ///
    /// # Errors
    ///
    /// Returns the rejected flow when the usernames differ.
    pub fn bind_identity(
        self,
        verified_username: Option<String>,
    ) -> Result<DuoFlow<states::Verified>, DuoFlow<states::Rejected>> {
        match verified_username {
            Some(username) if username == self.expected_username => {
                Ok(self.transition(states::Verified { username }))
            }
            actual => {
                let error = DuoError::IdentityMismatch {
                    expected: self.expected_username.clone(),
                    actual,
                };
                Err(self.rejected(error))
            }
        }
    }
}

impl DuoFlow<states::Verified> {
    /// Gets the username Duo verified.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.state.username
    }
}

impl DuoFlow<states::Rejected> {
    /// Gets the rejection error.
    #[must_use]
    pub const fn error(&self) -> &DuoError {
        &self.state.error
    }

    /// Gets the rejection reason.
    #[must_use]
    pub const fn reason(&self) -> RejectionReason {
        match self.state.error {
            DuoError::MissingResponse => RejectionReason::MissingResponse,
            DuoError::IdentityMismatch { .. } => RejectionReason::IdentityMismatch,
            DuoError::Verification(_) | DuoError::Signing(_) | DuoError::Configuration(_) => {
                RejectionReason::VerificationFailed
            }
        }
    }

    /// Converts to the rejection error.
    #[must_use]
    pub fn into_error(self) -> DuoError {
        self.state.error
    }
}
