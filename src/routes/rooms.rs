use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::room::{
        AcknowledgeRequest, AcknowledgeResponse, ArtifactResponse, CommitRequest, CommitResponse,
        JoinRequest, JoinResponse, RoomStateResponse, ViewerQuery, VoteRequest, VoteResponse,
    },
    error::AppError,
    services::{completion_service, matchmaking_service, session_service},
    state::SharedState,
};

/// Routes handling room matchmaking, sessions, and completion.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/join", post(join_room))
        .route("/rooms/{id}", get(room_state))
        .route("/rooms/{id}/votes", post(cast_vote))
        .route("/rooms/{id}/commits", post(commit_round))
        .route("/rooms/{id}/acknowledgements", post(acknowledge))
        .route("/rooms/{id}/artifact", get(artifact))
}

/// Join the matchmaking queue for a quest.
#[utoipa::path(
    post,
    path = "/rooms/join",
    tag = "rooms",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Participant placed in a room", body = JoinResponse),
        (status = 404, description = "Unknown quest"),
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<Json<JoinResponse>, AppError> {
    let summary = matchmaking_service::join(&state, payload).await?;
    Ok(Json(summary))
}

/// Fetch the full state of a room for polling clients.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(
        ("id" = Uuid, Path, description = "Room identifier"),
        ("participant_id" = Uuid, Query, description = "Member reading the room"),
    ),
    responses(
        (status = 200, description = "Current room state", body = RoomStateResponse),
        (status = 401, description = "Caller is not a member of the room"),
        (status = 404, description = "Room not found"),
    )
)]
pub async fn room_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<RoomStateResponse>, AppError> {
    let snapshot = matchmaking_service::room_state(&state, id, viewer.participant_id).await?;
    Ok(Json(snapshot))
}

/// Cast or revise a vote in the room's current round.
#[utoipa::path(
    post,
    path = "/rooms/{id}/votes",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 401, description = "Caller is not a member of the room"),
        (status = 409, description = "Wrong round, committed round, or inactive session"),
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<VoteRequest>>,
) -> Result<Json<VoteResponse>, AppError> {
    let summary = session_service::cast_vote(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Commit the room's current round on behalf of every member.
#[utoipa::path(
    post,
    path = "/rooms/{id}/commits",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = CommitRequest,
    responses(
        (status = 200, description = "Round committed", body = CommitResponse),
        (status = 401, description = "Caller is not a member of the room"),
        (status = 409, description = "Round already committed or session inactive"),
    )
)]
pub async fn commit_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CommitRequest>>,
) -> Result<Json<CommitResponse>, AppError> {
    let summary = session_service::commit_round(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Acknowledge a completed session; the last acknowledgement triggers artifact generation.
#[utoipa::path(
    post,
    path = "/rooms/{id}/acknowledgements",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = AcknowledgeRequest,
    responses(
        (status = 200, description = "Acknowledgement recorded", body = AcknowledgeResponse),
        (status = 401, description = "Caller is not a member of the room"),
        (status = 409, description = "Room is not completed"),
    )
)]
pub async fn acknowledge(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AcknowledgeRequest>>,
) -> Result<Json<AcknowledgeResponse>, AppError> {
    let summary = completion_service::acknowledge(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Fetch the generated artifact of a completed room.
#[utoipa::path(
    get,
    path = "/rooms/{id}/artifact",
    tag = "rooms",
    params(
        ("id" = Uuid, Path, description = "Room identifier"),
        ("participant_id" = Uuid, Query, description = "Member reading the artifact"),
    ),
    responses(
        (status = 200, description = "Generated artifact", body = ArtifactResponse),
        (status = 401, description = "Caller is not a member of the room"),
        (status = 404, description = "Room unknown or artifact not generated yet"),
    )
)]
pub async fn artifact(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<ArtifactResponse>, AppError> {
    let summary = completion_service::artifact(&state, id, viewer.participant_id).await?;
    Ok(Json(summary))
}
