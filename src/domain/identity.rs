//! Authenticated identity attached to a connection.

use serde::{Deserialize, Serialize};

/// Numeric user identifier issued by the upstream user store.
pub type UserId = i64;

/// Who is on the other end of a connection.
///
/// Produced by the handshake from a verified token; the hub never
/// authenticates anything itself and treats these values as trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Owning user. Several connections may share it.
    pub user_id: UserId,
    /// Role name, e.g. `"user"` or `"admin"`.
    pub role: String,
}

impl Identity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(user_id: UserId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    /// Returns `true` if this identity carries the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
