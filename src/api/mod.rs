//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Admin endpoints are mounted under `/api/v1`; system endpoints and the
//! WebSocket upgrade live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;

/// OpenAPI description of every HTTP endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "realtime-hub", description = "WebSocket connection hub with scoped event fan-out"),
    paths(
        handlers::system::health_handler,
        handlers::admin::ws_stats,
        handlers::admin::ws_broadcast,
        crate::ws::handler::ws_handler,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Process health"),
        (name = "Admin", description = "Hub introspection and manual broadcast"),
        (name = "Realtime", description = "WebSocket event stream"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by admin paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
