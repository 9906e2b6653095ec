//! Type-safe client identifier.
//!
//! [`ClientId`] is a newtype wrapper around [`uuid::Uuid`] (v4) so that
//! connection identifiers cannot be confused with user ids or other UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one live connection.
///
/// Generated at handshake time and never reused. One user may hold many
/// connections at once, each with its own `ClientId`; this is the key of
/// the hub registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    /// Creates a new random `ClientId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `ClientId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ClientId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
