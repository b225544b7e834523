pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        ArtifactEntity, BadgeAwardEntity, CommitEntity, MembershipEntity, RoomEntity, RoomStatus,
        VoteEntity,
    },
    storage::StorageResult,
};

/// Outcome of the atomic join-or-create matchmaking write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The participant already held an active membership for this quest.
    Rejoined {
        /// Room of the existing membership.
        room_id: Uuid,
    },
    /// Joined an existing open room.
    Joined {
        /// Room that was joined.
        room_id: Uuid,
        /// Whether this join filled the room and started the session.
        started: bool,
    },
    /// No open room had space; a fresh room was created with this founder.
    Created {
        /// Newly created room.
        room_id: Uuid,
    },
}

impl MatchOutcome {
    /// Room targeted by the outcome, whichever variant applied.
    pub fn room_id(&self) -> Uuid {
        match self {
            MatchOutcome::Rejoined { room_id }
            | MatchOutcome::Joined { room_id, .. }
            | MatchOutcome::Created { room_id } => *room_id,
        }
    }
}

/// Outcome of the conditional vote upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote stored (or overwrote the participant's earlier vote for the round).
    Recorded,
    /// Room does not exist.
    RoomNotFound,
    /// Voter is not a member of the room.
    NotAMember,
    /// Room is not in progress.
    NotInProgress {
        /// Status the room was observed in.
        status: RoomStatus,
    },
    /// Vote targets a round other than the open one.
    WrongRound {
        /// Round currently open.
        current: u8,
    },
    /// The targeted round already has its binding commit.
    RoundCommitted,
}

/// Outcome of the insert-if-absent commit write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// This caller won the race and the commit is binding.
    Committed {
        /// Whether this was the final round, flipping the room to completed.
        completed: bool,
    },
    /// Another member already committed this round; nothing was overwritten.
    AlreadyCommitted,
    /// Room does not exist.
    RoomNotFound,
    /// Committer is not a member of the room.
    NotAMember,
    /// Room is not in progress.
    NotInProgress {
        /// Status the room was observed in.
        status: RoomStatus,
    },
    /// Commit targets a round other than the open one.
    WrongRound {
        /// Round currently open.
        current: u8,
    },
}

/// Outcome of the idempotent completion acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Acknowledgement stamped (or already present).
    Acknowledged {
        /// Whether every member of the room has now acknowledged.
        all_completed: bool,
    },
    /// Room does not exist.
    RoomNotFound,
    /// Caller is not a member of the room.
    NotAMember,
    /// Room has not reached the completed status.
    NotCompleted {
        /// Status the room was observed in.
        status: RoomStatus,
    },
}

/// Abstraction over the persistence layer for rooms and everything scoped to them.
///
/// Every conditional operation re-validates its precondition inside the
/// backend's own atomicity guard (per-room lock in memory, unique index or
/// filtered update in MongoDB), so racing callers observe an outcome instead
/// of corrupting state.
pub trait RoomStore: Send + Sync {
    /// Atomic matchmaking step: re-enter an active membership, join the oldest
    /// open room with space (starting the session when it fills), or create a
    /// fresh room for the quest.
    fn join_or_create(
        &self,
        quest_id: String,
        participant_id: Uuid,
        country: Option<String>,
        max_members: u32,
    ) -> BoxFuture<'static, StorageResult<MatchOutcome>>;
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    fn members(&self, room_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<MembershipEntity>>>;
    fn votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<VoteEntity>>>;
    fn commits(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CommitEntity>>>;
    /// Upsert the vote for (room, participant, round) while the round is open.
    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<VoteOutcome>>;
    /// Insert-if-absent commit for (room, round); first writer wins and the
    /// room advances (next round, or completed after the final round).
    fn insert_commit(
        &self,
        commit: CommitEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>>;
    /// Stamp a member's completion acknowledgement; harmless when repeated.
    fn acknowledge_completion(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<AckOutcome>>;
    fn find_artifact(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ArtifactEntity>>>;
    /// Insert-if-absent artifact per room; a lost race degrades to returning
    /// the artifact that won.
    fn insert_artifact(
        &self,
        artifact: ArtifactEntity,
    ) -> BoxFuture<'static, StorageResult<ArtifactEntity>>;
    /// Insert-if-absent badge award; returns whether this call created it.
    fn insert_badge_award(
        &self,
        award: BadgeAwardEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn badge_awards(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<BadgeAwardEntity>>>;
    /// Completed rooms the participant was a member of.
    fn completed_room_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Distinct other participants ever sharing a room with this one.
    fn distinct_teammate_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Close in-progress rooms with no activity since `idle_since`; returns
    /// the rooms that were closed.
    fn close_idle_rooms(
        &self,
        idle_since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
