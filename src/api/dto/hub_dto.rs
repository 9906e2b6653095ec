//! Request/response bodies for the hub admin endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Response of `POST /api/v1/admin/ws/broadcast`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastResponse {
    /// Human-readable status.
    pub message: String,
    /// Number of registered clients when the broadcast was queued.
    pub recipients: usize,
}
