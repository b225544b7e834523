use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::quest::QuestsResponse, services::matchmaking_service, state::SharedState,
};

/// Routes exposing the quest catalog.
pub fn router() -> Router<SharedState> {
    Router::new().route("/quests", get(list_quests))
}

/// List the quests open for matchmaking.
#[utoipa::path(
    get,
    path = "/quests",
    tag = "quests",
    responses((status = 200, description = "Quest catalog", body = QuestsResponse))
)]
pub async fn list_quests(State(state): State<SharedState>) -> Json<QuestsResponse> {
    Json(matchmaking_service::list_quests(&state))
}
