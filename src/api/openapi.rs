//! OpenAPI document and, with the `swagger-ui` feature, the Swagger UI.

use axum::Router;
use utoipa::OpenApi;

use super::handlers::{session, system, tournament};
use crate::app_state::AppState;

/// Generated OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "knockout-gateway",
        description = "Bracket aggregation and live match officiating for knockout tournaments."
    ),
    paths(
        system::health_handler,
        tournament::get_bracket,
        session::list_sessions,
        session::open_session,
        session::get_session,
        session::close_session,
        session::apply_command,
        session::submit_event,
        session::rollback,
    ),
    tags(
        (name = "System", description = "Health"),
        (name = "Tournaments", description = "Bracket views"),
        (name = "Sessions", description = "Live officiating sessions"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/api-docs/openapi.json` together with the
/// Swagger UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

/// Serves the document at `/api-docs/openapi.json`.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
