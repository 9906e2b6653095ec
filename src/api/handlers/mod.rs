//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod system;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::timeout::TimeoutLayer;

use crate::app_state::AppState;

/// Upper bound on any `/api/v1` request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(admin::routes())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
}
