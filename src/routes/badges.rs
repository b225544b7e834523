use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::badge::BadgesResponse, error::AppError, services::badge_service, state::SharedState,
};

/// Routes exposing earned achievements.
pub fn router() -> Router<SharedState> {
    Router::new().route("/participants/{id}/badges", get(participant_badges))
}

/// List every badge a participant has earned.
#[utoipa::path(
    get,
    path = "/participants/{id}/badges",
    tag = "badges",
    params(("id" = Uuid, Path, description = "Participant identifier")),
    responses((status = 200, description = "Earned badges", body = BadgesResponse))
)]
pub async fn participant_badges(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BadgesResponse>, AppError> {
    let badges = badge_service::badges(&state, id).await?;
    Ok(Json(badges))
}
