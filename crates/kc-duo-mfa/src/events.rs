//! Audit events for Duo attempts.
//!
//! Every terminal decision (success, rejection, cancellation, unusable
//! configuration) produces one [`DuoEvent`]. Events carry usernames and
//! error codes, never key material.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Second factor completed.
    Login,
    /// Second factor failed.
    LoginError,
    /// User cancelled and the flow restarts.
    ResetFlow,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit record for one Duo decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuoEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Realm ID.
    pub realm_id: Option<Uuid>,
    /// Authentication session ID.
    pub session_id: Option<Uuid>,
    /// User being authenticated.
    pub username: Option<String>,
    /// Username Duo vouched for, when it differs from `username`.
    pub verified_username: Option<String>,
    /// Error code (failure events).
    pub error: Option<String>,
}

impl DuoEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }
}

/// Builder for [`DuoEvent`].
#[derive(Debug)]
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    realm_id: Option<Uuid>,
    session_id: Option<Uuid>,
    username: Option<String>,
    verified_username: Option<String>,
    error: Option<String>,
}

impl EventBuilder {
    /// Creates a builder with a success outcome.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            realm_id: None,
            session_id: None,
            username: None,
            verified_username: None,
            error: None,
        }
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the realm ID.
    #[must_use]
    pub const fn realm(mut self, realm_id: Uuid) -> Self {
        self.realm_id = Some(realm_id);
        self
    }

    /// Sets the session ID.
    #[must_use]
    pub const fn session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Sets the user being authenticated.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the username Duo returned.
    #[must_use]
    pub fn verified_username(mut self, username: Option<String>) -> Self {
        self.verified_username = username;
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> DuoEvent {
        DuoEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            realm_id: self.realm_id,
            session_id: self.session_id,
            username: self.username,
            verified_username: self.verified_username,
            error: self.error,
        }
    }
}

/// Destination for audit events.
pub trait EventSink: Send + Sync + Debug {
    /// Records an event.
    fn record(&self, event: DuoEvent);
}

/// Event sink that writes to the tracing framework at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: DuoEvent) {
        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            outcome = ?event.outcome,
            realm_id = ?event.realm_id,
            session_id = ?event.session_id,
            username = ?event.username,
            verified_username = ?event.verified_username,
            error = ?event.error,
            "duo_event"
        );
    }
}

/// Event sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: RwLock<Vec<DuoEvent>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<DuoEvent> {
        self.events.read().clone()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: DuoEvent) {
        self.events.write().push(event);
    }
}
