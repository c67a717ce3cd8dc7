//! Challenge and error pages.
//!
//! The challenge page hands the Duo script the signed request and API host,
//! plus an optional error. The script posts `sig_response` back, or the
//! user posts `cancel`.

use std::collections::HashMap;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Form field carrying the signed Duo response.
pub const FIELD_SIG_RESPONSE: &str = "sig_response";
/// Form field marking a cancellation.
pub const FIELD_CANCEL: &str = "cancel";

/// Duo challenge page template.
#[derive(Debug, Clone, Template)]
#[template(path = "duo-mfa.html")]
pub struct ChallengeForm {
    /// Signed challenge for the Duo iframe.
    pub sig_request: String,
    /// Duo API hostname.
    pub api_host: String,
    /// Scripts to load (the Duo Web client).
    pub scripts: Vec<String>,
    /// Form action URL.
    pub action_url: String,
    /// Error message to display.
    pub error: Option<String>,
}

/// Error page template.
#[derive(Debug, Clone, Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    /// Error message to display.
    pub error: String,
}

/// A page for the host to send back to the browser.
#[derive(Debug, Clone)]
pub enum Page {
    /// The Duo challenge form.
    Challenge(ChallengeForm),
    /// An error page with its status code.
    Error {
        /// HTTP status.
        status: StatusCode,
        /// Page content.
        page: ErrorPage,
    },
}

impl Page {
    /// Creates an internal-error page.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Error {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            page: ErrorPage {
                error: message.into(),
            },
        }
    }

    /// Returns the HTTP status for the page.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Challenge(_) => StatusCode::OK,
            Self::Error { status, .. } => *status,
        }
    }

    /// Returns the challenge form, if this is one.
    #[must_use]
    pub const fn challenge_form(&self) -> Option<&ChallengeForm> {
        match self {
            Self::Challenge(form) => Some(form),
            Self::Error { .. } => None,
        }
    }

    /// Returns the error message shown on the page, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Challenge(form) => form.error.as_deref(),
            Self::Error { page, .. } => Some(&page.error),
        }
    }

    /// Renders the page to HTML.
    ///
    /// # Errors
    ///
    /// Returns the template engine's error.
    pub fn render(&self) -> askama::Result<String> {
        match self {
            Self::Challenge(form) => form.render(),
            Self::Error { page, .. } => page.render(),
        }
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(html) => (self.status(), Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Fields posted back from the challenge page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    cancelled: bool,
    sig_response: Option<String>,
}

impl FormInputs {
    /// Extracts the Duo fields from decoded form data.
    ///
    /// A field counts as present whenever its key is, whatever its value.
    #[must_use]
    pub fn from_form_data(form_data: &HashMap<String, String>) -> Self {
        Self {
            cancelled: form_data.contains_key(FIELD_CANCEL),
            sig_response: form_data.get(FIELD_SIG_RESPONSE).cloned(),
        }
    }

    /// Whether the user cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The signed response, if posted.
    #[must_use]
    pub fn sig_response(&self) -> Option<&str> {
        self.sig_response.as_deref()
    }
}
