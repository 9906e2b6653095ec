//! Admin-only hub endpoints: stats and manual broadcast.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::BroadcastResponse;
use crate::app_state::AppState;
use crate::auth::AdminIdentity;
use crate::domain::{EventType, HubMessage, HubStats, Scope};
use crate::error::{ErrorResponse, HubError};

/// `GET /admin/ws/stats` — Connected client counts.
///
/// # Errors
///
/// Returns [`HubError::Unauthorized`] / [`HubError::Forbidden`] for
/// non-admin callers and [`HubError::HubUnavailable`] if the hub stopped.
#[utoipa::path(
    get,
    path = "/api/v1/admin/ws/stats",
    tag = "Admin",
    summary = "Realtime connection stats",
    description = "Returns the number of registered WebSocket clients and their breakdown by role.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Registry snapshot", body = HubStats),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn ws_stats(
    State(state): State<AppState>,
    _admin: AdminIdentity,
) -> Result<impl IntoResponse, HubError> {
    let stats = state.hub.stats().await?;
    Ok(Json(stats))
}

/// `POST /admin/ws/broadcast` — Send a `system_alert` to every client.
///
/// The request body is forwarded verbatim as the event `data`.
///
/// # Errors
///
/// Returns [`HubError::Unauthorized`] / [`HubError::Forbidden`] for
/// non-admin callers and [`HubError::HubUnavailable`] if the hub stopped.
#[utoipa::path(
    post,
    path = "/api/v1/admin/ws/broadcast",
    tag = "Admin",
    summary = "Broadcast a system alert",
    description = "Queues the JSON body as a `system_alert` event for every connected client and reports how many clients were registered at dispatch time.",
    security(("bearer" = [])),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Broadcast queued", body = BroadcastResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn ws_broadcast(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, HubError> {
    let delivery = state
        .hub
        .broadcast_confirmed(
            HubMessage::new(EventType::SYSTEM_ALERT, body),
            Scope::Broadcast,
        )
        .await?;
    // Evicted clients were registered when the broadcast was dispatched.
    let recipients = delivery.delivered + delivery.evicted.len();
    tracing::info!(
        admin_id = admin.user_id,
        recipients,
        evicted = delivery.evicted.len(),
        "admin broadcast queued"
    );

    Ok(Json(BroadcastResponse {
        message: "broadcast queued".to_string(),
        recipients,
    }))
}

/// Admin routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/ws/stats", get(ws_stats))
        .route("/admin/ws/broadcast", post(ws_broadcast))
}
