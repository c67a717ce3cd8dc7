//! # kc-duo-mfa
//!
//! Duo second-factor authenticator for Keycloak Rust authentication flows.
//!
//! The step validates the realm's Duo settings, renders a signed challenge
//! for the Duo Web iframe, and verifies the signed response the browser
//! posts back against the user identified by earlier steps.
//!
//! ## Features
//!
//! - Fail-closed validation of the four Duo settings
//! - Type-safe challenge state machine
//! - Pluggable Duo Web signing primitive ([`DuoWeb`])
//! - Structured audit events
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - IA-2(1): Multi-factor Authentication to Privileged Accounts
//! - IA-2(2): Multi-factor Authentication to Non-privileged Accounts
//! - AU-2: Event Logging
//!
//! ## Example
//!
//! ```ignore
//! use kc_duo_mfa::{AuthenticatorFactory, DuoMfaAuthenticatorFactory};
//!
//! let factory = DuoMfaAuthenticatorFactory::from_env(Arc::new(duo_web))?;
//! let authenticator = factory.create().await;
//!
//! // First visit: render the challenge
//! let result = authenticator.authenticate(&mut context).await?;
//!
//! // Form post: verify the Duo response
//! let result = authenticator.action(&mut context).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod authenticator;
pub mod challenge;
pub mod config;
pub mod duo_web;
pub mod error;
pub mod events;
pub mod factory;
pub mod flow;
pub mod form;
pub mod mfa;
pub mod settings;

pub use authenticator::{AuthContext, Authenticator, AuthenticatorResult, FlowUser};
pub use challenge::{ChallengeController, Resolution};
pub use config::{AuthenticatorConfig, ConfigError, ConfigValidator, ProviderCredentials};
pub use duo_web::{DuoWeb, DuoWebError, SignedRequest, SigningError, SigningService};
pub use error::{AuthError, AuthFlowError, AuthResult, DuoError};
pub use events::{DuoEvent, EventOutcome, EventSink, EventType, InMemoryEventSink, TracingEventSink};
pub use factory::{AuthenticatorFactory, ConfigProperty, DuoMfaAuthenticatorFactory, PropertyType, Requirement};
pub use flow::{states, DuoFlow, RejectionReason};
pub use form::{ChallengeForm, ErrorPage, FormInputs, Page};
pub use mfa::{DuoMfaAuthenticator, PROVIDER_ID};
pub use settings::{DuoSettings, SettingsError};
