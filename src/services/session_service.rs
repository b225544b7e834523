//! Vote and commit workflow for rooms with an active session.

use std::time::SystemTime;

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        models::{CommitEntity, VoteEntity},
        room_store::{CommitOutcome, VoteOutcome},
    },
    dto::room::{CommitRequest, CommitResponse, VoteRequest, VoteResponse},
    error::ServiceError,
    services::badge_service,
    state::SharedState,
};

/// Cast or revise a vote for the room's current round.
///
/// Votes stay mutable until the round is committed, so a participant may change
/// their mind by voting again with a different option.
pub async fn cast_vote(
    state: &SharedState,
    room_id: Uuid,
    request: VoteRequest,
) -> Result<VoteResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let vote = VoteEntity {
        room_id,
        participant_id: request.participant_id,
        round: request.round,
        option: request.option,
        justification: request.justification.unwrap_or_default(),
        cast_at: SystemTime::now(),
    };

    match store.record_vote(vote).await? {
        VoteOutcome::Recorded => {}
        VoteOutcome::RoomNotFound => {
            return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
        }
        VoteOutcome::NotAMember => {
            return Err(ServiceError::Unauthorized(
                "participant is not a member of this room".into(),
            ));
        }
        VoteOutcome::NotInProgress { status } => {
            return Err(ServiceError::InvalidState(format!(
                "room is {status:?}, voting requires an active session"
            )));
        }
        VoteOutcome::WrongRound { current } => {
            return Err(ServiceError::InvalidState(format!(
                "round {} is not open, the room is on round {current}",
                request.round
            )));
        }
        VoteOutcome::RoundCommitted => {
            return Err(ServiceError::InvalidState(format!(
                "round {} is already committed",
                request.round
            )));
        }
    }

    let members = store.members(room_id).await?;
    let votes_in_round = store
        .votes(room_id)
        .await?
        .iter()
        .filter(|vote| vote.round == request.round)
        .count();

    Ok(VoteResponse {
        round: request.round,
        option: request.option,
        all_voted: votes_in_round >= members.len(),
    })
}

/// Commit the room's current round, advancing the session or completing it.
///
/// Quorum is advisory: committing with missing votes is legal and only logged.
/// Exactly one commit per round ever lands; concurrent committers lose the race
/// and get a state conflict back.
pub async fn commit_round(
    state: &SharedState,
    room_id: Uuid,
    request: CommitRequest,
) -> Result<CommitResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let members = store.members(room_id).await?;
    let votes_in_round = store
        .votes(room_id)
        .await?
        .iter()
        .filter(|vote| vote.round == request.round)
        .count();
    if !members.is_empty() && votes_in_round < members.len() {
        warn!(
            %room_id,
            round = request.round,
            votes = votes_in_round,
            members = members.len(),
            "committing round without full quorum"
        );
    }

    let commit = CommitEntity {
        room_id,
        round: request.round,
        option: request.option,
        committed_by: request.participant_id,
        committed_at: SystemTime::now(),
    };

    let completed = match store.insert_commit(commit).await? {
        CommitOutcome::Committed { completed } => completed,
        CommitOutcome::AlreadyCommitted => {
            return Err(ServiceError::InvalidState(format!(
                "round {} is already committed",
                request.round
            )));
        }
        CommitOutcome::RoomNotFound => {
            return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
        }
        CommitOutcome::NotAMember => {
            return Err(ServiceError::Unauthorized(
                "participant is not a member of this room".into(),
            ));
        }
        CommitOutcome::NotInProgress { status } => {
            return Err(ServiceError::InvalidState(format!(
                "room is {status:?}, committing requires an active session"
            )));
        }
        CommitOutcome::WrongRound { current } => {
            return Err(ServiceError::InvalidState(format!(
                "round {} is not open, the room is on round {current}",
                request.round
            )));
        }
    };

    if completed {
        // Achievement evaluation never blocks or fails the commit response.
        badge_service::dispatch(state.clone(), room_id);
    }

    Ok(CommitResponse {
        round: request.round,
        option: request.option,
        completed,
    })
}
