//! Matchmaking participants into decision rooms and read-only room projections.

use uuid::Uuid;

use crate::{
    dao::{
        models::{RoomEntity, RoomStatus},
        room_store::MatchOutcome,
    },
    dto::{
        format_system_time,
        quest::{DecisionSummary, QuestSummary, QuestsResponse},
        room::{JoinOutcome, JoinRequest, JoinResponse, RoomStateResponse},
    },
    error::ServiceError,
    state::{SharedState, session},
};

/// Place a participant in a room for the requested quest, creating one if needed.
///
/// Joining is idempotent: a participant with an active membership for the quest
/// is routed back to their existing room.
pub async fn join(state: &SharedState, request: JoinRequest) -> Result<JoinResponse, ServiceError> {
    let quest = state
        .config()
        .quest(&request.quest_id)
        .ok_or_else(|| ServiceError::NotFound(format!("quest `{}` not found", request.quest_id)))?;
    let quest_id = quest.id.clone();
    let max_members = quest.max_members;

    let store = state.require_room_store().await?;
    let outcome = store
        .join_or_create(
            quest_id.clone(),
            request.participant_id,
            request.country,
            max_members,
        )
        .await?;

    let room_id = outcome.room_id();
    let status = match store.find_room(room_id).await? {
        Some(room) => room.status,
        // The room existed a moment ago; report the conservative state.
        None => RoomStatus::Closed,
    };

    let outcome = match outcome {
        MatchOutcome::Created { .. } => JoinOutcome::Created,
        MatchOutcome::Joined { .. } => JoinOutcome::Joined,
        MatchOutcome::Rejoined { .. } => JoinOutcome::Rejoined,
    };

    Ok(JoinResponse {
        room_id,
        quest_id,
        outcome,
        status,
    })
}

/// Full room snapshot for polling clients; members only.
pub async fn room_state(
    state: &SharedState,
    room_id: Uuid,
    viewer: Uuid,
) -> Result<RoomStateResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let Some(room) = store.find_room(room_id).await? else {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    };

    let members = store.members(room_id).await?;
    if !members.iter().any(|member| member.participant_id == viewer) {
        return Err(ServiceError::Unauthorized(
            "participant is not a member of this room".into(),
        ));
    }
    let votes = store.votes(room_id).await?;
    let commits = store.commits(room_id).await?;
    let artifact_id = store.find_artifact(room_id).await?.map(|a| a.id);

    Ok(project_room(state, room, members, votes, commits, artifact_id))
}

/// List the quests currently offered for matchmaking.
pub fn list_quests(state: &SharedState) -> QuestsResponse {
    QuestsResponse {
        quests: state.config().quests().map(QuestSummary::from).collect(),
    }
}

fn project_room(
    state: &SharedState,
    room: RoomEntity,
    members: Vec<crate::dao::models::MembershipEntity>,
    votes: Vec<crate::dao::models::VoteEntity>,
    commits: Vec<crate::dao::models::CommitEntity>,
    artifact_id: Option<Uuid>,
) -> RoomStateResponse {
    let in_progress = room.status == RoomStatus::InProgress;

    let round_phase = in_progress.then(|| {
        let votes_in_round = votes
            .iter()
            .filter(|vote| vote.round == room.current_round)
            .count();
        // The current round never has a commit yet; committed rounds are history.
        session::round_phase(votes_in_round, members.len(), false).into()
    });

    let current_decision = in_progress
        .then(|| {
            state
                .config()
                .quest(&room.quest_id)
                .and_then(|quest| quest.decision(room.current_round))
                .map(DecisionSummary::from)
        })
        .flatten();

    RoomStateResponse {
        id: room.id,
        quest_id: room.quest_id,
        status: room.status,
        current_round: (room.current_round > 0).then_some(room.current_round),
        round_phase,
        current_decision,
        members: members.into_iter().map(Into::into).collect(),
        votes: votes.into_iter().map(Into::into).collect(),
        commits: commits.into_iter().map(Into::into).collect(),
        artifact_id,
        created_at: format_system_time(room.created_at),
        started_at: room.started_at.map(format_system_time),
        completed_at: room.completed_at.map(format_system_time),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        dto::room::{JoinOutcome, RoundPhaseDto},
        services::test_support,
        state::quest::QuestMode,
    };

    fn join_request(participant: Uuid, quest_id: &str) -> JoinRequest {
        JoinRequest {
            participant_id: participant,
            quest_id: quest_id.to_owned(),
            country: None,
        }
    }

    #[tokio::test]
    async fn join_unknown_quest_is_not_found() {
        let state = test_support::state_with(vec![]).await;

        let err = join(&state, join_request(Uuid::new_v4(), "missing"))
            .await
            .expect_err("must fail");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn joins_fill_the_room_and_start_the_session() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;

        let first = join(&state, join_request(Uuid::new_v4(), "trio"))
            .await
            .expect("first join");
        assert_eq!(first.outcome, JoinOutcome::Created);
        assert_eq!(first.status, RoomStatus::Open);

        let second = join(&state, join_request(Uuid::new_v4(), "trio"))
            .await
            .expect("second join");
        assert_eq!(second.outcome, JoinOutcome::Joined);
        assert_eq!(second.room_id, first.room_id);

        let last = Uuid::new_v4();
        let third = join(&state, join_request(last, "trio"))
            .await
            .expect("third join");
        assert_eq!(third.room_id, first.room_id);
        assert_eq!(third.status, RoomStatus::InProgress);

        let snapshot = room_state(&state, first.room_id, last).await.expect("state");
        assert_eq!(snapshot.current_round, Some(1));
        assert!(matches!(snapshot.round_phase, Some(RoundPhaseDto::Voting)));
        assert!(snapshot.current_decision.is_some());
        assert_eq!(snapshot.members.len(), 3);
    }

    #[tokio::test]
    async fn rejoin_routes_back_to_the_active_room() {
        let state =
            test_support::state_with(vec![test_support::quest("duo", QuestMode::Team, 2, 2)])
                .await;
        let participant = Uuid::new_v4();

        let first = join(&state, join_request(participant, "duo"))
            .await
            .expect("join");
        let again = join(&state, join_request(participant, "duo"))
            .await
            .expect("rejoin");

        assert_eq!(again.outcome, JoinOutcome::Rejoined);
        assert_eq!(again.room_id, first.room_id);
    }

    #[tokio::test]
    async fn room_state_for_unknown_room_is_not_found() {
        let state = test_support::state_with(vec![]).await;

        let err = room_state(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .expect_err("must fail");
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn room_state_is_member_only() {
        let state =
            test_support::state_with(vec![test_support::quest("duo", QuestMode::Team, 2, 2)])
                .await;
        let member = Uuid::new_v4();
        let room_id = join(&state, join_request(member, "duo"))
            .await
            .expect("join")
            .room_id;

        let err = room_state(&state, room_id, Uuid::new_v4())
            .await
            .expect_err("outsider must be rejected");
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        room_state(&state, room_id, member)
            .await
            .expect("member can read the room");
    }
}
