use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Serve the interactive Swagger UI at `/docs`.
///
/// The OpenAPI document itself stays addressable at `/api-doc/openapi.json`
/// for non-browser consumers.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::from(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
