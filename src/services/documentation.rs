use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Decision Rooms.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::quests::list_quests,
        crate::routes::rooms::join_room,
        crate::routes::rooms::room_state,
        crate::routes::rooms::cast_vote,
        crate::routes::rooms::commit_round,
        crate::routes::rooms::acknowledge,
        crate::routes::rooms::artifact,
        crate::routes::badges::participant_badges,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::quest::QuestsResponse,
            crate::dto::quest::QuestSummary,
            crate::dto::quest::DecisionSummary,
            crate::dto::quest::DecisionOptionSummary,
            crate::dto::room::JoinRequest,
            crate::dto::room::JoinResponse,
            crate::dto::room::JoinOutcome,
            crate::dto::room::RoomStateResponse,
            crate::dto::room::MemberSummary,
            crate::dto::room::VoteRequest,
            crate::dto::room::VoteResponse,
            crate::dto::room::VoteSummary,
            crate::dto::room::CommitRequest,
            crate::dto::room::CommitResponse,
            crate::dto::room::CommitSummary,
            crate::dto::room::RoundPhaseDto,
            crate::dto::room::AcknowledgeRequest,
            crate::dto::room::AcknowledgeResponse,
            crate::dto::room::ArtifactResponse,
            crate::dto::badge::BadgesResponse,
            crate::dto::badge::BadgeSummary,
            crate::dao::models::RoomStatus,
            crate::dao::models::BadgeKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quests", description = "Quest catalog"),
        (name = "rooms", description = "Matchmaking, voting, and completion"),
        (name = "badges", description = "Earned achievements"),
    )
)]
pub struct ApiDoc;
