use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    quest::OptionKey,
    session::{ROUND_COUNT, SessionPhase},
};

/// Lifecycle status of a room; only ever moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Accepting members below capacity.
    Open,
    /// Reached capacity; the session starts in the same write.
    Full,
    /// Voting/committing through the rounds.
    InProgress,
    /// Final round committed; gathering acknowledgements.
    Completed,
    /// Force-closed by the inactivity sweep; terminal.
    Closed,
}

/// One team attempt at a quest, persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Quest this room is an attempt at.
    pub quest_id: String,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Round currently open for voting (1-based; stays at the final round once completed).
    pub current_round: u8,
    /// Number of members; maintained atomically with membership writes.
    pub member_count: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last activity timestamp, refreshed by joins, votes and commits.
    pub updated_at: SystemTime,
    /// When the session started (room filled).
    pub started_at: Option<SystemTime>,
    /// When the final round was committed.
    pub completed_at: Option<SystemTime>,
}

impl RoomEntity {
    /// Build a fresh open room for a quest.
    pub fn new(quest_id: String, at: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            quest_id,
            status: RoomStatus::Open,
            current_round: 1,
            member_count: 0,
            created_at: at,
            updated_at: at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether the room still counts as an active membership target.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            RoomStatus::Open | RoomStatus::Full | RoomStatus::InProgress
        )
    }

    /// Project the persisted fields onto the session state machine.
    pub fn phase(&self) -> SessionPhase {
        match self.status {
            RoomStatus::Open => SessionPhase::Gathering { full: false },
            RoomStatus::Full => SessionPhase::Gathering { full: true },
            RoomStatus::InProgress => SessionPhase::Voting {
                round: self.current_round,
            },
            RoomStatus::Completed => SessionPhase::Completed,
            RoomStatus::Closed => SessionPhase::Closed,
        }
    }

    /// Write a session phase back onto the persisted fields.
    pub fn apply_phase(&mut self, phase: SessionPhase, at: SystemTime) {
        match phase {
            SessionPhase::Gathering { full: false } => self.status = RoomStatus::Open,
            SessionPhase::Gathering { full: true } => self.status = RoomStatus::Full,
            SessionPhase::Voting { round } => {
                self.status = RoomStatus::InProgress;
                self.current_round = round;
                if self.started_at.is_none() {
                    self.started_at = Some(at);
                }
            }
            SessionPhase::Completed => {
                self.status = RoomStatus::Completed;
                self.current_round = ROUND_COUNT;
                self.completed_at = Some(at);
            }
            SessionPhase::Closed => self.status = RoomStatus::Closed,
        }
        self.updated_at = at;
    }
}

/// Link between a participant and a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipEntity {
    /// Room the participant belongs to.
    pub room_id: Uuid,
    /// Authenticated participant identifier, passed in by the identity provider.
    pub participant_id: Uuid,
    /// Optional country supplied by the identity context; feeds one badge predicate.
    pub country: Option<String>,
    /// When the participant joined the room.
    pub joined_at: SystemTime,
    /// When the participant acknowledged room completion, if they have.
    pub completed_ack_at: Option<SystemTime>,
}

/// One participant's choice for one round; mutable until the round commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    /// Room the vote belongs to.
    pub room_id: Uuid,
    /// Voting participant.
    pub participant_id: Uuid,
    /// Round the vote targets (1-based).
    pub round: u8,
    /// Chosen option.
    pub option: OptionKey,
    /// Short justification shown in the artifact.
    pub justification: String,
    /// Last time the vote was (re)cast.
    pub cast_at: SystemTime,
}

/// The room's binding choice for a round; immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitEntity {
    /// Room the commit belongs to.
    pub room_id: Uuid,
    /// Committed round (1-based).
    pub round: u8,
    /// The binding option.
    pub option: OptionKey,
    /// Member who issued the commit.
    pub committed_by: Uuid,
    /// When the commit was written.
    pub committed_at: SystemTime,
}

/// Generated summary document for a completed room; at most one per room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactEntity {
    /// Primary key of the artifact.
    pub id: Uuid,
    /// Room the artifact summarizes.
    pub room_id: Uuid,
    /// Quest the room attempted.
    pub quest_id: String,
    /// Document title.
    pub title: String,
    /// Rendered document content.
    pub content: String,
    /// When the artifact was generated.
    pub created_at: SystemTime,
}

/// Achievement types awarded by the badge engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    /// First completed quest ever.
    FirstQuest,
    /// Completed at least five quests.
    QuestMaster,
    /// Played with at least ten distinct teammates.
    SocialButterfly,
    /// Completed a team-mode quest in a room of three or more.
    TeamPlayer,
    /// Voted in every round of the quest.
    DedicatedVoter,
    /// Wrote substantial justifications in every round.
    Storyteller,
    /// Issued the final, completing commit.
    Decider,
    /// Member of a room whose artifact was generated.
    Chronicler,
    /// Every member voted every round and every round was committed.
    TeamSpirit,
    /// Some round was decided by a unanimous vote.
    Unanimous,
    /// Room members spanned three or more countries.
    WorldlyCrew,
}

/// Awarded achievement; unique per (participant, kind, room scope).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeAwardEntity {
    /// Awarded participant.
    pub participant_id: Uuid,
    /// Achievement type.
    pub kind: BadgeKind,
    /// Room scope; `None` for once-ever achievements.
    pub room_id: Option<Uuid>,
    /// When the award was written.
    pub awarded_at: SystemTime,
}
