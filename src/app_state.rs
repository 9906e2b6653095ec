//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::ClientSettings;
use crate::hub::Hub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the hub control loop.
    pub hub: Hub,
    /// Verifies handshake and admin tokens.
    pub verifier: Arc<TokenVerifier>,
    /// Settings applied to every new connection.
    pub clients: ClientSettings,
}
