//! Point-in-time registry snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Registry size and role breakdown at the moment it was taken.
///
/// Computed by the hub control loop on request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct HubStats {
    /// Number of registered clients.
    pub total_clients: usize,
    /// Number of registered clients per role.
    #[serde(rename = "by_role")]
    pub counts_by_role: BTreeMap<String, usize>,
}

impl HubStats {
    /// Returns the count for `role`, or zero if nobody holds it.
    #[must_use]
    pub fn role_count(&self, role: &str) -> usize {
        self.counts_by_role.get(role).copied().unwrap_or(0)
    }
}
