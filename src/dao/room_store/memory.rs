//! In-memory [`RoomStore`] backend.
//!
//! Capacity checks, commit inserts and acknowledgements must be atomic with
//! their validation, so every room lives behind its own async mutex and
//! matchmaking serializes per quest. This backend backs the unit tests and
//! storage-less deployments; the invariants it enforces under lock are the
//! same ones the MongoDB backend enforces with unique indexes.

use std::{
    collections::HashSet,
    sync::Arc,
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AckOutcome, CommitOutcome, MatchOutcome, RoomStore, VoteOutcome};
use crate::{
    dao::{
        models::{
            ArtifactEntity, BadgeAwardEntity, BadgeKind, CommitEntity, MembershipEntity,
            RoomEntity, RoomStatus, VoteEntity,
        },
        storage::StorageResult,
    },
    state::session::{self, SessionEvent, SessionPhase},
};

type AwardKey = (Uuid, BadgeKind, Option<Uuid>);

/// Everything scoped to one room, guarded by a single lock.
struct RoomRecord {
    room: RoomEntity,
    members: Vec<MembershipEntity>,
    votes: Vec<VoteEntity>,
    commits: Vec<CommitEntity>,
}

impl RoomRecord {
    fn member(&self, participant_id: Uuid) -> Option<&MembershipEntity> {
        self.members
            .iter()
            .find(|member| member.participant_id == participant_id)
    }

    fn commit_for(&self, round: u8) -> Option<&CommitEntity> {
        self.commits.iter().find(|commit| commit.round == round)
    }

    /// Add a member and start the session when the room fills.
    fn add_member(&mut self, member: MembershipEntity, max_members: u32, at: SystemTime) -> bool {
        self.members.push(member);
        self.room.member_count += 1;
        self.room.updated_at = at;

        if self.room.member_count >= max_members {
            self.room
                .apply_phase(SessionPhase::Gathering { full: true }, at);
            if let Ok(next) = session::advance(self.room.phase(), SessionEvent::Start) {
                self.room.apply_phase(next, at);
            }
            return true;
        }

        false
    }
}

/// Room ids of one quest in creation order; the lock serializes matchmaking.
#[derive(Default)]
struct QuestRooms {
    room_ids: Vec<Uuid>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<Uuid, Arc<Mutex<RoomRecord>>>,
    quests: DashMap<String, Arc<Mutex<QuestRooms>>>,
    artifacts: DashMap<Uuid, ArtifactEntity>,
    awards: DashMap<AwardKey, BadgeAwardEntity>,
}

/// In-memory storage backend keyed by per-room and per-quest locks.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift a room's last-activity timestamp into the past.
    #[cfg(test)]
    pub async fn backdate_room(&self, room_id: Uuid, by: std::time::Duration) {
        if let Some(handle) = self.inner.rooms.get(&room_id).map(|entry| entry.value().clone()) {
            let mut record = handle.lock().await;
            record.room.updated_at -= by;
        }
    }

    fn room_handles(&self) -> Vec<Arc<Mutex<RoomRecord>>> {
        self.inner
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn join_or_create(
        &self,
        quest_id: String,
        participant_id: Uuid,
        country: Option<String>,
        max_members: u32,
    ) -> StorageResult<MatchOutcome> {
        let now = SystemTime::now();
        let quest = self
            .inner
            .quests
            .entry(quest_id.clone())
            .or_default()
            .clone();
        let mut quest_rooms = quest.lock().await;

        // Idempotent re-entry: an active membership short-circuits matchmaking.
        let handles: Vec<Arc<Mutex<RoomRecord>>> = quest_rooms
            .room_ids
            .iter()
            .filter_map(|id| self.inner.rooms.get(id).map(|entry| entry.value().clone()))
            .collect();
        for handle in &handles {
            let record = handle.lock().await;
            if record.room.is_active() && record.member(participant_id).is_some() {
                return Ok(MatchOutcome::Rejoined {
                    room_id: record.room.id,
                });
            }
        }

        let membership = |room_id| MembershipEntity {
            room_id,
            participant_id,
            country: country.clone(),
            joined_at: now,
            completed_ack_at: None,
        };

        // Oldest open room below capacity wins.
        for handle in &handles {
            let mut record = handle.lock().await;
            if record.room.status == RoomStatus::Open && record.room.member_count < max_members {
                let room_id = record.room.id;
                let started = record.add_member(membership(room_id), max_members, now);
                return Ok(MatchOutcome::Joined { room_id, started });
            }
        }

        let room = RoomEntity::new(quest_id, now);
        let room_id = room.id;
        let mut record = RoomRecord {
            room,
            members: Vec::new(),
            votes: Vec::new(),
            commits: Vec::new(),
        };
        record.add_member(membership(room_id), max_members, now);
        self.inner
            .rooms
            .insert(room_id, Arc::new(Mutex::new(record)));
        quest_rooms.room_ids.push(room_id);

        Ok(MatchOutcome::Created { room_id })
    }

    async fn record_vote(&self, vote: VoteEntity) -> StorageResult<VoteOutcome> {
        let Some(handle) = self
            .inner
            .rooms
            .get(&vote.room_id)
            .map(|entry| entry.value().clone())
        else {
            return Ok(VoteOutcome::RoomNotFound);
        };

        let mut record = handle.lock().await;
        if record.member(vote.participant_id).is_none() {
            return Ok(VoteOutcome::NotAMember);
        }
        if record.room.status != RoomStatus::InProgress {
            return Ok(VoteOutcome::NotInProgress {
                status: record.room.status,
            });
        }
        if vote.round != record.room.current_round {
            return Ok(VoteOutcome::WrongRound {
                current: record.room.current_round,
            });
        }
        if record.commit_for(vote.round).is_some() {
            return Ok(VoteOutcome::RoundCommitted);
        }

        record.room.updated_at = vote.cast_at;
        let slot = record
            .votes
            .iter_mut()
            .find(|existing| {
                existing.participant_id == vote.participant_id && existing.round == vote.round
            });
        match slot {
            Some(existing) => *existing = vote,
            None => record.votes.push(vote),
        }

        Ok(VoteOutcome::Recorded)
    }

    async fn insert_commit(&self, commit: CommitEntity) -> StorageResult<CommitOutcome> {
        let Some(handle) = self
            .inner
            .rooms
            .get(&commit.room_id)
            .map(|entry| entry.value().clone())
        else {
            return Ok(CommitOutcome::RoomNotFound);
        };

        let mut record = handle.lock().await;
        if record.member(commit.committed_by).is_none() {
            return Ok(CommitOutcome::NotAMember);
        }
        // Duplicate commits report as such even if the room has since moved on.
        if record.commit_for(commit.round).is_some() {
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let next = match session::advance(
            record.room.phase(),
            SessionEvent::CommitRound {
                round: commit.round,
            },
        ) {
            Ok(next) => next,
            Err(_) if record.room.status != RoomStatus::InProgress => {
                return Ok(CommitOutcome::NotInProgress {
                    status: record.room.status,
                });
            }
            Err(_) => {
                return Ok(CommitOutcome::WrongRound {
                    current: record.room.current_round,
                });
            }
        };

        let at = commit.committed_at;
        record.commits.push(commit);
        record.room.apply_phase(next, at);

        Ok(CommitOutcome::Committed {
            completed: next == SessionPhase::Completed,
        })
    }

    async fn acknowledge_completion(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        at: SystemTime,
    ) -> StorageResult<AckOutcome> {
        let Some(handle) = self
            .inner
            .rooms
            .get(&room_id)
            .map(|entry| entry.value().clone())
        else {
            return Ok(AckOutcome::RoomNotFound);
        };

        let mut record = handle.lock().await;
        if record.room.status != RoomStatus::Completed {
            return Ok(AckOutcome::NotCompleted {
                status: record.room.status,
            });
        }
        let Some(member) = record
            .members
            .iter_mut()
            .find(|member| member.participant_id == participant_id)
        else {
            return Ok(AckOutcome::NotAMember);
        };

        if member.completed_ack_at.is_none() {
            member.completed_ack_at = Some(at);
        }
        let all_completed = record
            .members
            .iter()
            .all(|member| member.completed_ack_at.is_some());

        Ok(AckOutcome::Acknowledged { all_completed })
    }

    fn insert_artifact(&self, artifact: ArtifactEntity) -> ArtifactEntity {
        use dashmap::mapref::entry::Entry;

        match self.inner.artifacts.entry(artifact.room_id) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(artifact.clone());
                artifact
            }
        }
    }

    fn insert_badge_award(&self, award: BadgeAwardEntity) -> bool {
        use dashmap::mapref::entry::Entry;

        let key = (award.participant_id, award.kind, award.room_id);
        match self.inner.awards.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(award);
                true
            }
        }
    }

    async fn completed_room_count(&self, participant_id: Uuid) -> u64 {
        let mut count = 0;
        for handle in self.room_handles() {
            let record = handle.lock().await;
            if record.room.status == RoomStatus::Completed
                && record.member(participant_id).is_some()
            {
                count += 1;
            }
        }
        count
    }

    async fn distinct_teammate_count(&self, participant_id: Uuid) -> u64 {
        let mut teammates = HashSet::new();
        for handle in self.room_handles() {
            let record = handle.lock().await;
            if record.member(participant_id).is_some() {
                for member in &record.members {
                    if member.participant_id != participant_id {
                        teammates.insert(member.participant_id);
                    }
                }
            }
        }
        teammates.len() as u64
    }

    async fn close_idle_rooms(&self, idle_since: SystemTime) -> Vec<Uuid> {
        let mut closed = Vec::new();
        for handle in self.room_handles() {
            let mut record = handle.lock().await;
            if record.room.status == RoomStatus::InProgress && record.room.updated_at < idle_since {
                if let Ok(next) = session::advance(record.room.phase(), SessionEvent::Close) {
                    record.room.apply_phase(next, SystemTime::now());
                    closed.push(record.room.id);
                }
            }
        }
        closed
    }
}

impl RoomStore for MemoryRoomStore {
    fn join_or_create(
        &self,
        quest_id: String,
        participant_id: Uuid,
        country: Option<String>,
        max_members: u32,
    ) -> BoxFuture<'static, StorageResult<MatchOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .join_or_create(quest_id, participant_id, country, max_members)
                .await
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(handle) = store.inner.rooms.get(&id).map(|entry| entry.value().clone())
            else {
                return Ok(None);
            };
            let record = handle.lock().await;
            Ok(Some(record.room.clone()))
        })
    }

    fn members(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MembershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(handle) = store
                .inner
                .rooms
                .get(&room_id)
                .map(|entry| entry.value().clone())
            else {
                return Ok(Vec::new());
            };
            let record = handle.lock().await;
            Ok(record.members.clone())
        })
    }

    fn votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<VoteEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(handle) = store
                .inner
                .rooms
                .get(&room_id)
                .map(|entry| entry.value().clone())
            else {
                return Ok(Vec::new());
            };
            let record = handle.lock().await;
            Ok(record.votes.clone())
        })
    }

    fn commits(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CommitEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(handle) = store
                .inner
                .rooms
                .get(&room_id)
                .map(|entry| entry.value().clone())
            else {
                return Ok(Vec::new());
            };
            let record = handle.lock().await;
            Ok(record.commits.clone())
        })
    }

    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<VoteOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.record_vote(vote).await })
    }

    fn insert_commit(
        &self,
        commit: CommitEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.insert_commit(commit).await })
    }

    fn acknowledge_completion(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<AckOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .acknowledge_completion(room_id, participant_id, at)
                .await
        })
    }

    fn find_artifact(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ArtifactEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .artifacts
                .get(&room_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn insert_artifact(
        &self,
        artifact: ArtifactEntity,
    ) -> BoxFuture<'static, StorageResult<ArtifactEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_artifact(artifact)) })
    }

    fn insert_badge_award(
        &self,
        award: BadgeAwardEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_badge_award(award)) })
    }

    fn badge_awards(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<BadgeAwardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .awards
                .iter()
                .filter(|entry| entry.value().participant_id == participant_id)
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn completed_room_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.completed_room_count(participant_id).await) })
    }

    fn distinct_teammate_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.distinct_teammate_count(participant_id).await) })
    }

    fn close_idle_rooms(
        &self,
        idle_since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.close_idle_rooms(idle_since).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;
    use crate::state::quest::OptionKey;

    const QUEST: &str = "outage-drill";

    fn vote(room_id: Uuid, participant_id: Uuid, round: u8, option: OptionKey) -> VoteEntity {
        VoteEntity {
            room_id,
            participant_id,
            round,
            option,
            justification: "because".into(),
            cast_at: SystemTime::now(),
        }
    }

    fn commit(room_id: Uuid, committed_by: Uuid, round: u8, option: OptionKey) -> CommitEntity {
        CommitEntity {
            room_id,
            round,
            option,
            committed_by,
            committed_at: SystemTime::now(),
        }
    }

    async fn filled_room(store: &MemoryRoomStore, capacity: u32) -> (Uuid, Vec<Uuid>) {
        let participants: Vec<Uuid> = (0..capacity).map(|_| Uuid::new_v4()).collect();
        let mut room_id = None;
        for participant in &participants {
            let outcome = store
                .join_or_create(QUEST.into(), *participant, None, capacity)
                .await
                .unwrap();
            room_id = Some(outcome.room_id());
        }
        (room_id.unwrap(), participants)
    }

    async fn completed_room(store: &MemoryRoomStore, capacity: u32) -> (Uuid, Vec<Uuid>) {
        let (room_id, participants) = filled_room(store, capacity).await;
        for round in 1..=3 {
            store
                .insert_commit(commit(room_id, participants[0], round, OptionKey::A))
                .await
                .unwrap();
        }
        (room_id, participants)
    }

    #[tokio::test]
    async fn concurrent_joins_never_overfill() {
        let store = MemoryRoomStore::new();
        let joins = (0..10).map(|_| {
            let store = store.clone();
            async move {
                store
                    .join_or_create(QUEST.into(), Uuid::new_v4(), None, 3)
                    .await
                    .unwrap()
            }
        });
        let outcomes = join_all(joins).await;

        let mut room_ids: Vec<Uuid> = outcomes.iter().map(MatchOutcome::room_id).collect();
        room_ids.sort();
        room_ids.dedup();
        // 10 participants over capacity-3 rooms: four rooms, none above capacity.
        assert_eq!(room_ids.len(), 4);
        for room_id in room_ids {
            let room = RoomStore::find_room(&store, room_id).await.unwrap().unwrap();
            assert!(room.member_count <= 3);
        }
    }

    #[tokio::test]
    async fn three_concurrent_joins_share_one_room() {
        let store = MemoryRoomStore::new();
        let joins = (0..3).map(|_| {
            let store = store.clone();
            async move {
                store
                    .join_or_create(QUEST.into(), Uuid::new_v4(), None, 3)
                    .await
                    .unwrap()
            }
        });
        let outcomes = join_all(joins).await;

        let first = outcomes[0].room_id();
        assert!(outcomes.iter().all(|outcome| outcome.room_id() == first));
        let room = RoomStore::find_room(&store, first).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::InProgress);
        assert_eq!(room.current_round, 1);
        assert_eq!(room.member_count, 3);
    }

    #[tokio::test]
    async fn rejoin_is_idempotent() {
        let store = MemoryRoomStore::new();
        let participant = Uuid::new_v4();
        let first = store
            .join_or_create(QUEST.into(), participant, None, 3)
            .await
            .unwrap();
        let second = store
            .join_or_create(QUEST.into(), participant, None, 3)
            .await
            .unwrap();

        assert!(matches!(first, MatchOutcome::Created { .. }));
        assert_eq!(
            second,
            MatchOutcome::Rejoined {
                room_id: first.room_id()
            }
        );
        let room = RoomStore::find_room(&store, first.room_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.member_count, 1);
    }

    #[tokio::test]
    async fn votes_upsert_until_commit() {
        let store = MemoryRoomStore::new();
        let (room_id, participants) = filled_room(&store, 2).await;

        let outcome = store
            .record_vote(vote(room_id, participants[0], 1, OptionKey::A))
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Recorded);
        let outcome = store
            .record_vote(vote(room_id, participants[0], 1, OptionKey::B))
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Recorded);

        let votes = RoomStore::votes(&store, room_id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].option, OptionKey::B);

        store
            .insert_commit(commit(room_id, participants[1], 1, OptionKey::B))
            .await
            .unwrap();
        let outcome = store
            .record_vote(vote(room_id, participants[0], 1, OptionKey::C))
            .await
            .unwrap();
        // The round moved on, so a stale round-1 vote is a wrong-round write.
        assert_eq!(outcome, VoteOutcome::WrongRound { current: 2 });
    }

    #[tokio::test]
    async fn vote_requires_membership_and_progress() {
        let store = MemoryRoomStore::new();
        let (room_id, _participants) = filled_room(&store, 2).await;

        let outsider = Uuid::new_v4();
        let outcome = store
            .record_vote(vote(room_id, outsider, 1, OptionKey::A))
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::NotAMember);

        let open = store
            .join_or_create("another-quest".into(), Uuid::new_v4(), None, 3)
            .await
            .unwrap();
        let founder = RoomStore::members(&store, open.room_id()).await.unwrap()[0].participant_id;
        let outcome = store
            .record_vote(vote(open.room_id(), founder, 1, OptionKey::A))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::NotInProgress {
                status: RoomStatus::Open
            }
        );
    }

    #[tokio::test]
    async fn commit_race_has_a_single_winner() {
        let store = MemoryRoomStore::new();
        let (room_id, participants) = filled_room(&store, 3).await;

        let attempts = participants.iter().map(|participant| {
            let store = store.clone();
            let participant = *participant;
            async move {
                store
                    .insert_commit(commit(room_id, participant, 1, OptionKey::A))
                    .await
                    .unwrap()
            }
        });
        let outcomes = join_all(attempts).await;

        let winners = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CommitOutcome::Committed { .. }))
            .count();
        let losers = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CommitOutcome::AlreadyCommitted))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, 2);

        let commits = RoomStore::commits(&store, room_id).await.unwrap();
        assert_eq!(commits.len(), 1);
        let room = RoomStore::find_room(&store, room_id).await.unwrap().unwrap();
        assert_eq!(room.current_round, 2);
    }

    #[tokio::test]
    async fn final_commit_completes_the_room() {
        let store = MemoryRoomStore::new();
        let (room_id, participants) = filled_room(&store, 2).await;

        for round in 1..=2 {
            let outcome = store
                .insert_commit(commit(room_id, participants[0], round, OptionKey::B))
                .await
                .unwrap();
            assert_eq!(outcome, CommitOutcome::Committed { completed: false });
        }
        let outcome = store
            .insert_commit(commit(room_id, participants[1], 3, OptionKey::C))
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed { completed: true });

        let room = RoomStore::find_room(&store, room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Completed);
        assert_eq!(room.current_round, 3);
        assert!(room.completed_at.is_some());
    }

    #[tokio::test]
    async fn acknowledgement_barrier_counts_every_member() {
        let store = MemoryRoomStore::new();
        let (room_id, participants) = completed_room(&store, 3).await;

        let now = SystemTime::now();
        for participant in &participants[..2] {
            let outcome = store
                .acknowledge_completion(room_id, *participant, now)
                .await
                .unwrap();
            assert_eq!(
                outcome,
                AckOutcome::Acknowledged {
                    all_completed: false
                }
            );
        }
        let outcome = store
            .acknowledge_completion(room_id, participants[2], now)
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::Acknowledged { all_completed: true });

        // Repeats stay acknowledged and keep reporting completion.
        let outcome = store
            .acknowledge_completion(room_id, participants[0], now)
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::Acknowledged { all_completed: true });
    }

    #[tokio::test]
    async fn artifact_insert_keeps_the_first_row() {
        let store = MemoryRoomStore::new();
        let room_id = Uuid::new_v4();
        let artifact = |title: &str| ArtifactEntity {
            id: Uuid::new_v4(),
            room_id,
            quest_id: QUEST.into(),
            title: title.into(),
            content: "doc".into(),
            created_at: SystemTime::now(),
        };

        let inserts = (0..2).map(|index| {
            let store = store.clone();
            let artifact = artifact(if index == 0 { "first" } else { "second" });
            async move { RoomStore::insert_artifact(&store, artifact).await.unwrap() }
        });
        let results = join_all(inserts).await;

        assert_eq!(results[0].id, results[1].id);
        let stored = RoomStore::find_artifact(&store, room_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, results[0].id);
    }

    #[tokio::test]
    async fn badge_awards_are_idempotent() {
        let store = MemoryRoomStore::new();
        let participant = Uuid::new_v4();
        let award = BadgeAwardEntity {
            participant_id: participant,
            kind: BadgeKind::QuestMaster,
            room_id: None,
            awarded_at: SystemTime::now(),
        };

        assert!(store.insert_badge_award(award.clone()));
        assert!(!store.insert_badge_award(award));
        let awards = RoomStore::badge_awards(&store, participant).await.unwrap();
        assert_eq!(awards.len(), 1);
    }

    #[tokio::test]
    async fn idle_sweep_closes_only_stale_in_progress_rooms() {
        let store = MemoryRoomStore::new();
        let (stale_id, _) = filled_room(&store, 2).await;
        let open = store
            .join_or_create("other".into(), Uuid::new_v4(), None, 3)
            .await
            .unwrap();

        let cutoff = SystemTime::now() + Duration::from_secs(1);
        let closed = store.close_idle_rooms(cutoff).await;
        assert_eq!(closed, vec![stale_id]);

        let room = RoomStore::find_room(&store, stale_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Closed);
        let untouched = RoomStore::find_room(&store, open.room_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, RoomStatus::Open);

        // Closed rooms are excluded from matchmaking and further commits.
        let commit_outcome = store
            .insert_commit(commit(
                stale_id,
                RoomStore::members(&store, stale_id).await.unwrap()[0].participant_id,
                1,
                OptionKey::A,
            ))
            .await
            .unwrap();
        assert_eq!(
            commit_outcome,
            CommitOutcome::NotInProgress {
                status: RoomStatus::Closed
            }
        );
    }
}
