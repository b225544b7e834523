use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        ArtifactEntity, CommitEntity, MembershipEntity, RoomStatus, VoteEntity,
    },
    dto::{
        format_system_time,
        quest::DecisionSummary,
        validation::{validate_country, validate_justification, validate_quest_id},
    },
    state::{quest::OptionKey, session::RoundPhase},
};

/// Payload used to join the matchmaking queue for a quest.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    pub participant_id: Uuid,
    #[validate(custom(function = "validate_quest_id"))]
    pub quest_id: String,
    /// Optional ISO 3166 alpha-2 country code of the participant.
    #[serde(default)]
    #[validate(custom(function = "validate_country"))]
    pub country: Option<String>,
}

/// Identity of the member issuing a read, passed in the query string.
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    /// Member reading the room.
    pub participant_id: Uuid,
}

/// How the matchmaker placed the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    /// A fresh room was created for this participant.
    Created,
    /// The participant took a free slot in an existing room.
    Joined,
    /// The participant already had an active membership for this quest.
    Rejoined,
}

/// Summary returned once a participant has been placed in a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub room_id: Uuid,
    pub quest_id: String,
    pub outcome: JoinOutcome,
    pub status: RoomStatus,
}

/// Public projection of a room member.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberSummary {
    pub participant_id: Uuid,
    pub country: Option<String>,
    pub joined_at: String,
    /// Whether this member has acknowledged the completed session.
    pub acknowledged: bool,
}

impl From<MembershipEntity> for MemberSummary {
    fn from(member: MembershipEntity) -> Self {
        Self {
            participant_id: member.participant_id,
            country: member.country,
            joined_at: format_system_time(member.joined_at),
            acknowledged: member.completed_ack_at.is_some(),
        }
    }
}

/// Public projection of a cast vote.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteSummary {
    pub participant_id: Uuid,
    pub round: u8,
    pub option: OptionKey,
    pub justification: Option<String>,
    pub cast_at: String,
}

impl From<VoteEntity> for VoteSummary {
    fn from(vote: VoteEntity) -> Self {
        let cast_at = format_system_time(vote.cast_at);
        Self {
            participant_id: vote.participant_id,
            round: vote.round,
            option: vote.option,
            justification: (!vote.justification.is_empty()).then_some(vote.justification),
            cast_at,
        }
    }
}

/// Public projection of a committed round.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommitSummary {
    pub round: u8,
    pub option: OptionKey,
    pub committed_by: Uuid,
    pub committed_at: String,
}

impl From<CommitEntity> for CommitSummary {
    fn from(commit: CommitEntity) -> Self {
        Self {
            round: commit.round,
            option: commit.option,
            committed_by: commit.committed_by,
            committed_at: format_system_time(commit.committed_at),
        }
    }
}

/// Advisory state of the round currently being voted on.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhaseDto {
    Voting,
    AllVoted,
    Committed,
}

impl From<RoundPhase> for RoundPhaseDto {
    fn from(phase: RoundPhase) -> Self {
        match phase {
            RoundPhase::Voting => Self::Voting,
            RoundPhase::AllVoted => Self::AllVoted,
            RoundPhase::Committed => Self::Committed,
        }
    }
}

/// Full room snapshot returned by the room state route.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomStateResponse {
    pub id: Uuid,
    pub quest_id: String,
    pub status: RoomStatus,
    /// 1-based round currently being voted on; absent before the session starts.
    pub current_round: Option<u8>,
    /// Advisory phase of the current round; absent outside active sessions.
    pub round_phase: Option<RoundPhaseDto>,
    /// Decision script for the current round; absent outside active sessions.
    pub current_decision: Option<DecisionSummary>,
    pub members: Vec<MemberSummary>,
    pub votes: Vec<VoteSummary>,
    pub commits: Vec<CommitSummary>,
    /// Identifier of the generated artifact once the session completed.
    pub artifact_id: Option<Uuid>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Payload used to cast or revise a vote in the current round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteRequest {
    pub participant_id: Uuid,
    /// 1-based round the vote targets; must match the room's current round.
    #[validate(range(min = 1, max = 3))]
    pub round: u8,
    pub option: OptionKey,
    #[serde(default)]
    #[validate(custom(function = "validate_justification"))]
    pub justification: Option<String>,
}

/// Summary returned once a vote has been recorded.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub round: u8,
    pub option: OptionKey,
    /// Whether every current member has now voted in this round.
    pub all_voted: bool,
}

/// Payload used to commit the current round for the whole room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CommitRequest {
    pub participant_id: Uuid,
    /// 1-based round being committed; must match the room's current round.
    #[validate(range(min = 1, max = 3))]
    pub round: u8,
    pub option: OptionKey,
}

/// Summary returned once a round has been committed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommitResponse {
    pub round: u8,
    pub option: OptionKey,
    /// Whether this commit was the final one and the session is completed.
    pub completed: bool,
}

/// Payload used to acknowledge a completed session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AcknowledgeRequest {
    pub participant_id: Uuid,
}

/// Summary returned once an acknowledgement has been recorded.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcknowledgeResponse {
    /// Whether every member has now acknowledged the completed session.
    pub all_completed: bool,
    /// Set once the artifact exists, which is guaranteed when `all_completed` is true.
    pub artifact_id: Option<Uuid>,
}

/// Generated quest artifact for a completed room.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArtifactResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub quest_id: String,
    pub title: String,
    /// Markdown rendering of the room's decision history.
    pub content: String,
    pub created_at: String,
}

impl From<ArtifactEntity> for ArtifactResponse {
    fn from(artifact: ArtifactEntity) -> Self {
        Self {
            id: artifact.id,
            room_id: artifact.room_id,
            quest_id: artifact.quest_id,
            title: artifact.title,
            content: artifact.content,
            created_at: format_system_time(artifact.created_at),
        }
    }
}
