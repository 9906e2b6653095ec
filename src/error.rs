//! Error types with HTTP status code mapping.
//!
//! [`HubError`] is the error type for everything reachable from an HTTP
//! route: the upgrade handshake, the admin endpoints, and hub queries.
//! Transport failures on an established connection use
//! [`crate::ws::connection::ConnectionError`] instead and never reach HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1101,
///     "message": "unauthorized: missing token"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category       | HTTP Status                   |
/// |-----------|----------------|-------------------------------|
/// | 1000–1099 | Validation     | 400 Bad Request               |
/// | 1100–1199 | Authentication | 401 Unauthorized / 403 Forbidden |
/// | 3000–3999 | Server         | 500 / 503                     |
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Credential missing, malformed, expired, or badly signed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credential valid but lacks the required role.
    #[error("forbidden: requires role {0}")]
    Forbidden(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The hub control loop is no longer running.
    #[error("hub unavailable")]
    HubUnavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized(_) => 1101,
            Self::Forbidden(_) => 1102,
            Self::Internal(_) => 3000,
            Self::HubUnavailable => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::HubUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for HubError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
