//! Authenticator trait and host-facing types.
//!
//! Authenticators are pluggable components that perform specific
//! authentication steps. The host calls [`Authenticator::authenticate`]
//! when the step is reached and [`Authenticator::action`] when the browser
//! posts the step's form back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::AuthenticatorConfig;
use crate::error::{AuthFlowError, AuthResult};
use crate::form::Page;

/// Result of an authenticator execution.
///
/// Exactly one result is produced per invocation.
#[derive(Debug, Clone)]
pub enum AuthenticatorResult {
    /// Authentication succeeded for this step.
    Success,
    /// Show a page and wait for the user.
    Challenge {
        /// Page to render.
        page: Page,
    },
    /// The attempt failed; show a page explaining it.
    FailureChallenge {
        /// Error code for the flow engine.
        error: AuthFlowError,
        /// Page to render.
        page: Page,
    },
    /// Flow should be restarted.
    FlowReset,
}

impl AuthenticatorResult {
    /// Creates a success result.
    #[must_use]
    pub const fn success() -> Self {
        Self::Success
    }

    /// Creates a challenge result.
    #[must_use]
    pub const fn challenge(page: Page) -> Self {
        Self::Challenge { page }
    }

    /// Creates a failure challenge result.
    #[must_use]
    pub const fn failure_challenge(error: AuthFlowError, page: Page) -> Self {
        Self::FailureChallenge { error, page }
    }

    /// Creates a flow reset result.
    #[must_use]
    pub const fn flow_reset() -> Self {
        Self::FlowReset
    }

    /// Checks if this is a success result.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Checks if this is a challenge result.
    #[must_use]
    pub const fn is_challenge(&self) -> bool {
        matches!(self, Self::Challenge { .. })
    }

    /// Checks if this is a failure challenge result.
    #[must_use]
    pub const fn is_failure_challenge(&self) -> bool {
        matches!(self, Self::FailureChallenge { .. })
    }

    /// Checks if this is a flow reset result.
    #[must_use]
    pub const fn is_flow_reset(&self) -> bool {
        matches!(self, Self::FlowReset)
    }

    /// Gets the flow error of a failure challenge.
    #[must_use]
    pub const fn flow_error(&self) -> Option<AuthFlowError> {
        match self {
            Self::FailureChallenge { error, .. } => Some(*error),
            _ => None,
        }
    }

    /// Gets the page to render, if any.
    #[must_use]
    pub const fn page(&self) -> Option<&Page> {
        match self {
            Self::Challenge { page } | Self::FailureChallenge { page, .. } => Some(page),
            Self::Success | Self::FlowReset => None,
        }
    }
}

/// User being authenticated, as identified by earlier steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowUser {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
}

/// Authentication context passed to authenticators.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Realm ID.
    pub realm_id: Uuid,
    /// Authentication session ID.
    pub session_id: Uuid,
    /// User identified by earlier steps (if any).
    pub user: Option<FlowUser>,
    /// Configuration of this authenticator in the realm's flow.
    pub authenticator_config: Option<Arc<AuthenticatorConfig>>,
    /// Decoded form data from the request.
    pub form_data: HashMap<String, String>,
}

impl AuthContext {
    /// Creates a new authentication context.
    #[must_use]
    pub fn new(realm_id: Uuid, session_id: Uuid) -> Self {
        Self {
            realm_id,
            session_id,
            user: None,
            authenticator_config: None,
            form_data: HashMap::new(),
        }
    }

    /// Sets the user.
    #[must_use]
    pub fn with_user(mut self, id: Uuid, username: impl Into<String>) -> Self {
        self.user = Some(FlowUser {
            id,
            username: username.into(),
        });
        self
    }

    /// Sets the authenticator configuration.
    #[must_use]
    pub fn with_config(mut self, config: Arc<AuthenticatorConfig>) -> Self {
        self.authenticator_config = Some(config);
        self
    }

    /// Adds a form value.
    #[must_use]
    pub fn with_form_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    /// Gets a form value.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form_data.get(key).map(String::as_str)
    }

    /// Gets the identified user's name.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

/// Authenticator trait.
///
/// Authenticators are executed during authentication flows to verify
/// user identity using various methods.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the authenticator ID.
    fn id(&self) -> &'static str;

    /// Returns the display name.
    fn display_name(&self) -> &'static str;

    /// Checks if this authenticator requires a user to be set.
    fn requires_user(&self) -> bool {
        true
    }

    /// Checks if this authenticator is configurable.
    fn is_configurable(&self) -> bool {
        false
    }

    /// Checks if the user has what this authenticator needs.
    fn configured_for(&self, _context: &AuthContext) -> bool {
        true
    }

    /// Registers required actions for users not yet configured.
    fn set_required_actions(&self, _context: &AuthContext) {}

    /// Authenticates the user.
    ///
    /// Called when the authenticator is first executed.
    async fn authenticate(&self, context: &mut AuthContext) -> AuthResult<AuthenticatorResult>;

    /// Handles a challenge response.
    ///
    /// Called when the user responds to a challenge.
    async fn action(&self, context: &mut AuthContext) -> AuthResult<AuthenticatorResult> {
        // Default implementation just calls authenticate
        self.authenticate(context).await
    }

    /// Releases resources held for the request.
    fn close(&self) {}
}
