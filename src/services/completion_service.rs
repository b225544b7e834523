//! Completion acknowledgement barrier and the exactly-once artifact trigger.

use std::time::SystemTime;

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::room_store::AckOutcome,
    dto::room::{AcknowledgeRequest, AcknowledgeResponse, ArtifactResponse},
    error::ServiceError,
    services::{artifact_service, badge_service},
    state::SharedState,
};

/// Record a member's acknowledgement of the completed session.
///
/// Acknowledging is idempotent: repeats are no-ops that still report the
/// barrier state. The acknowledgement that completes the barrier triggers
/// artifact generation; a failed generation leaves the room recoverable by the
/// next acknowledgement call.
pub async fn acknowledge(
    state: &SharedState,
    room_id: Uuid,
    request: AcknowledgeRequest,
) -> Result<AcknowledgeResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let all_completed = match store
        .acknowledge_completion(room_id, request.participant_id, SystemTime::now())
        .await?
    {
        AckOutcome::Acknowledged { all_completed } => all_completed,
        AckOutcome::RoomNotFound => {
            return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
        }
        AckOutcome::NotAMember => {
            return Err(ServiceError::Unauthorized(
                "participant is not a member of this room".into(),
            ));
        }
        AckOutcome::NotCompleted { status } => {
            return Err(ServiceError::InvalidState(format!(
                "room is {status:?}, acknowledgement requires a completed session"
            )));
        }
    };

    let artifact_id = if all_completed {
        let artifact = artifact_service::generate(state, &store, room_id).await?;
        // Re-run achievement checks now that the artifact exists.
        badge_service::dispatch(state.clone(), room_id);
        Some(artifact.id)
    } else {
        store.find_artifact(room_id).await?.map(|artifact| artifact.id)
    };

    Ok(AcknowledgeResponse {
        all_completed,
        artifact_id,
    })
}

/// Fetch the generated artifact for a room; members only.
pub async fn artifact(
    state: &SharedState,
    room_id: Uuid,
    viewer: Uuid,
) -> Result<ArtifactResponse, ServiceError> {
    let store = state.require_room_store().await?;

    if store.find_room(room_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    }
    let members = store.members(room_id).await?;
    if !members.iter().any(|member| member.participant_id == viewer) {
        return Err(ServiceError::Unauthorized(
            "participant is not a member of this room".into(),
        ));
    }

    match store.find_artifact(room_id).await? {
        Some(artifact) => Ok(artifact.into()),
        None => {
            warn!(%room_id, "artifact requested before generation");
            Err(ServiceError::NotFound(
                "artifact not generated yet".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{services::test_support, state::quest::QuestMode};

    async fn completed_trio(state: &SharedState) -> (Uuid, Vec<Uuid>) {
        let participants: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut room_id = None;
        for participant in &participants {
            room_id = Some(test_support::join(state, *participant, "trio").await);
        }
        let room_id = room_id.expect("room");
        test_support::commit_all_rounds(state, room_id, participants[0]).await;
        (room_id, participants)
    }

    fn ack(participant: Uuid) -> AcknowledgeRequest {
        AcknowledgeRequest {
            participant_id: participant,
        }
    }

    #[tokio::test]
    async fn barrier_releases_only_after_every_member_acknowledged() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;
        let (room_id, participants) = completed_trio(&state).await;

        let first = acknowledge(&state, room_id, ack(participants[0]))
            .await
            .expect("first ack");
        assert!(!first.all_completed);
        assert!(first.artifact_id.is_none());

        let second = acknowledge(&state, room_id, ack(participants[1]))
            .await
            .expect("second ack");
        assert!(!second.all_completed);
        assert!(second.artifact_id.is_none());

        let third = acknowledge(&state, room_id, ack(participants[2]))
            .await
            .expect("third ack");
        assert!(third.all_completed);
        let artifact_id = third.artifact_id.expect("artifact generated");

        // A duplicate acknowledgement stays a no-op and reports the same artifact.
        let again = acknowledge(&state, room_id, ack(participants[2]))
            .await
            .expect("duplicate ack");
        assert!(again.all_completed);
        assert_eq!(again.artifact_id, Some(artifact_id));
    }

    #[tokio::test]
    async fn concurrent_final_acknowledgements_share_one_artifact() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;
        let (room_id, participants) = completed_trio(&state).await;

        acknowledge(&state, room_id, ack(participants[0]))
            .await
            .expect("ack");
        acknowledge(&state, room_id, ack(participants[1]))
            .await
            .expect("ack");

        let (left, right) = tokio::join!(
            acknowledge(&state, room_id, ack(participants[2])),
            acknowledge(&state, room_id, ack(participants[2])),
        );
        let left = left.expect("left ack");
        let right = right.expect("right ack");

        assert!(left.all_completed && right.all_completed);
        let left_id = left.artifact_id.expect("left artifact");
        let right_id = right.artifact_id.expect("right artifact");
        assert_eq!(left_id, right_id);
    }

    #[tokio::test]
    async fn acknowledging_an_active_room_is_a_state_conflict() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;
        let participant = Uuid::new_v4();
        let room_id = test_support::join(&state, participant, "trio").await;

        let err = acknowledge(&state, room_id, ack(participant))
            .await
            .expect_err("room still gathering");
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn artifact_lookup_before_generation_is_not_found() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;
        let (room_id, participants) = completed_trio(&state).await;

        let err = artifact(&state, room_id, participants[0])
            .await
            .expect_err("no artifact yet");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = artifact(&state, room_id, Uuid::new_v4())
            .await
            .expect_err("outsider must be rejected");
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn generated_artifact_chronicles_every_round() {
        let state =
            test_support::state_with(vec![test_support::quest("trio", QuestMode::Team, 3, 3)])
                .await;
        let (room_id, participants) = completed_trio(&state).await;
        for participant in &participants {
            acknowledge(&state, room_id, ack(*participant))
                .await
                .expect("ack");
        }

        let chronicle = artifact(&state, room_id, participants[0])
            .await
            .expect("artifact");
        assert_eq!(chronicle.room_id, room_id);
        for round in 1..=3 {
            assert!(chronicle.content.contains(&format!("## Round {round}")));
        }
    }
}
