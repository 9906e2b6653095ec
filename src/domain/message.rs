//! Hub messages, event type tags, and broadcast scopes.
//!
//! A [`HubMessage`] is what producers hand to the hub. The [`Scope`] it is
//! dispatched with decides who receives it and is never stored on the
//! client side.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::identity::UserId;

/// String tag identifying what happened.
///
/// The hub is agnostic to the meaning of event types: producers may use
/// any value. The associated constants name the types the rest of the
/// system emits today.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// Sent to a client right after it is registered.
    pub const CONNECTION_ESTABLISHED: Self = Self::from_static("connection_established");
    /// A user account was created.
    pub const USER_CREATED: Self = Self::from_static("user_created");
    /// A user account was modified.
    pub const USER_UPDATED: Self = Self::from_static("user_updated");
    /// A user account was deleted.
    pub const USER_DELETED: Self = Self::from_static("user_deleted");
    /// A user's role changed.
    pub const ROLE_CHANGED: Self = Self::from_static("role_changed");
    /// A user edited their own profile.
    pub const PROFILE_UPDATED: Self = Self::from_static("profile_updated");
    /// A user changed their password.
    pub const PASSWORD_CHANGED: Self = Self::from_static("password_changed");
    /// Operator-issued notice to every connected client.
    pub const SYSTEM_ALERT: Self = Self::from_static("system_alert");

    /// Creates an event type from a static string.
    #[must_use]
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl From<&'static str> for EventType {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A server-generated event destined for one or more clients.
#[derive(Debug, Clone)]
pub struct HubMessage {
    /// Event tag, serialized as `type` on the wire.
    pub event_type: EventType,
    /// Arbitrary JSON payload, serialized as `data` on the wire.
    pub payload: serde_json::Value,
    /// When the message was produced.
    pub created_at: DateTime<Utc>,
}

impl HubMessage {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<EventType>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Target selector used when a message is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every registered client.
    Broadcast,
    /// Every client belonging to the given user.
    ToUser(UserId),
    /// Every client holding the given role.
    ToRole(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => f.write_str("all"),
            Self::ToUser(user_id) => write!(f, "user:{user_id}"),
            Self::ToRole(role) => write!(f, "role:{role}"),
        }
    }
}
