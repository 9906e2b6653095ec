//! Axum WebSocket upgrade handler.
//!
//! Browsers cannot attach headers to a WebSocket handshake, so the bearer
//! token travels as the `token` query parameter. The token is verified
//! before the upgrade is accepted; a rejected request never produces a
//! [`Client`].

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use utoipa::IntoParams;

use super::client::Client;
use super::connection::WebSocketConnection;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, HubError};

/// Query parameters accepted by the upgrade endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WsQuery {
    /// Signed access token identifying the user.
    pub token: Option<String>,
}

/// `GET /ws` — Upgrade an authenticated HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`HubError::Unauthorized`] if the token is missing or invalid.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "Realtime",
    summary = "Open a realtime event stream",
    description = "Upgrades to a WebSocket that receives `{type, data, timestamp}` event frames. Authenticate with the `token` query parameter.",
    params(WsQuery),
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<impl IntoResponse, HubError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HubError::Unauthorized("missing token".to_string()))?;
    let identity = state.verifier.verify(&token)?;
    tracing::debug!(user_id = identity.user_id, role = %identity.role, "upgrade accepted");

    let settings = state.clients;
    let hub = state.hub;
    Ok(ws
        .max_message_size(settings.max_message_size)
        .on_upgrade(move |socket| async move {
            let connection = WebSocketConnection::from_socket(socket, settings.liveness);
            Client::new(identity, connection, settings.liveness, settings.queue_capacity)
                .run(hub)
                .await;
        }))
}
