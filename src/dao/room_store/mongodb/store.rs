use std::{collections::HashSet, sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Bson, DateTime, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoArtifactDocument, MongoBadgeAwardDocument, MongoCommitDocument,
        MongoMembershipDocument, MongoRoomDocument, MongoVoteDocument, doc_id, uuid_as_binary,
    },
};
use crate::{
    dao::{
        models::{
            ArtifactEntity, BadgeAwardEntity, CommitEntity, MembershipEntity, RoomEntity,
            RoomStatus, VoteEntity,
        },
        room_store::{AckOutcome, CommitOutcome, MatchOutcome, RoomStore, VoteOutcome},
        storage::StorageResult,
    },
    state::session::{self, SessionEvent, SessionPhase},
};

const ROOM_COLLECTION: &str = "rooms";
const MEMBERSHIP_COLLECTION: &str = "memberships";
const VOTE_COLLECTION: &str = "votes";
const COMMIT_COLLECTION: &str = "commits";
const ARTIFACT_COLLECTION: &str = "artifacts";
const AWARD_COLLECTION: &str = "badge_awards";

const ACTIVE_STATUSES: [&str; 3] = ["open", "full", "in_progress"];
const MATCH_ATTEMPTS: u32 = 5;

/// MongoDB-backed room store.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11_000
    )
}

fn query_err(collection: &'static str) -> impl FnOnce(mongodb::error::Error) -> MongoDaoError {
    move |source| MongoDaoError::Query { collection, source }
}

fn write_err(
    collection: &'static str,
    room_id: Uuid,
) -> impl FnOnce(mongodb::error::Error) -> MongoDaoError {
    move |source| MongoDaoError::Write {
        collection,
        room_id,
        source,
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Unique indexes are the arbiter for every insert-if-absent contract.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let unique = |keys, name: &str| {
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build()
        };

        // At most one OPEN room per quest, so racing creators collapse onto
        // a single room instead of fragmenting the queue.
        let open_room = IndexModel::builder()
            .keys(doc! {"quest_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("quest_open_room_idx".to_owned()))
                    .unique(Some(true))
                    .partial_filter_expression(Some(doc! {"status": "open"}))
                    .build(),
            )
            .build();
        database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION)
            .create_index(open_room)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROOM_COLLECTION,
                index: "quest_id(open)",
                source,
            })?;

        database
            .collection::<MongoMembershipDocument>(MEMBERSHIP_COLLECTION)
            .create_index(unique(
                doc! {"room_id": 1, "participant_id": 1},
                "membership_room_participant_idx",
            ))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MEMBERSHIP_COLLECTION,
                index: "room_id,participant_id",
                source,
            })?;

        database
            .collection::<MongoVoteDocument>(VOTE_COLLECTION)
            .create_index(unique(
                doc! {"room_id": 1, "participant_id": 1, "round": 1},
                "vote_room_participant_round_idx",
            ))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: VOTE_COLLECTION,
                index: "room_id,participant_id,round",
                source,
            })?;

        database
            .collection::<MongoCommitDocument>(COMMIT_COLLECTION)
            .create_index(unique(
                doc! {"room_id": 1, "round": 1},
                "commit_room_round_idx",
            ))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: COMMIT_COLLECTION,
                index: "room_id,round",
                source,
            })?;

        database
            .collection::<MongoArtifactDocument>(ARTIFACT_COLLECTION)
            .create_index(unique(doc! {"room_id": 1}, "artifact_room_idx"))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ARTIFACT_COLLECTION,
                index: "room_id",
                source,
            })?;

        database
            .collection::<MongoBadgeAwardDocument>(AWARD_COLLECTION)
            .create_index(unique(
                doc! {"participant_id": 1, "kind": 1, "room_id": 1},
                "award_participant_kind_scope_idx",
            ))
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: AWARD_COLLECTION,
                index: "participant_id,kind,room_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn rooms(&self) -> Collection<MongoRoomDocument> {
        self.database().await.collection(ROOM_COLLECTION)
    }

    async fn memberships(&self) -> Collection<MongoMembershipDocument> {
        self.database().await.collection(MEMBERSHIP_COLLECTION)
    }

    async fn votes(&self) -> Collection<MongoVoteDocument> {
        self.database().await.collection(VOTE_COLLECTION)
    }

    async fn commits(&self) -> Collection<MongoCommitDocument> {
        self.database().await.collection(COMMIT_COLLECTION)
    }

    async fn artifacts(&self) -> Collection<MongoArtifactDocument> {
        self.database().await.collection(ARTIFACT_COLLECTION)
    }

    async fn awards(&self) -> Collection<MongoBadgeAwardDocument> {
        self.database().await.collection(AWARD_COLLECTION)
    }

    async fn find_room(&self, id: Uuid) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .rooms()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(query_err(ROOM_COLLECTION))?;
        Ok(document.map(Into::into))
    }

    async fn find_membership(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> MongoResult<Option<MembershipEntity>> {
        let document = self
            .memberships()
            .await
            .find_one(doc! {
                "room_id": uuid_as_binary(room_id),
                "participant_id": uuid_as_binary(participant_id),
            })
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?;
        Ok(document.map(Into::into))
    }

    async fn participant_room_ids(&self, participant_id: Uuid) -> MongoResult<Vec<Uuid>> {
        let documents: Vec<MongoMembershipDocument> = self
            .memberships()
            .await
            .find(doc! {"participant_id": uuid_as_binary(participant_id)})
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?;
        Ok(documents.into_iter().map(|doc| doc.room_id).collect())
    }

    /// Room of the participant's active membership for a quest, if any.
    async fn find_active_room(
        &self,
        participant_id: Uuid,
        quest_id: &str,
    ) -> MongoResult<Option<Uuid>> {
        let room_ids = self.participant_room_ids(participant_id).await?;
        if room_ids.is_empty() {
            return Ok(None);
        }

        let ids: Vec<Bson> = room_ids
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();
        let room = self
            .rooms()
            .await
            .find_one(doc! {
                "_id": {"$in": ids},
                "quest_id": quest_id,
                "status": {"$in": ACTIVE_STATUSES.to_vec()},
            })
            .await
            .map_err(query_err(ROOM_COLLECTION))?;
        Ok(room.map(|doc| RoomEntity::from(doc).id))
    }

    async fn join_or_create(
        &self,
        quest_id: String,
        participant_id: Uuid,
        country: Option<String>,
        max_members: u32,
    ) -> MongoResult<MatchOutcome> {
        let now = SystemTime::now();

        // Re-entry check. Two racing joins by the same participant can both
        // pass it and land memberships in two rooms; clients issue one join
        // at a time, and the membership index only dedupes within a room.
        if let Some(room_id) = self.find_active_room(participant_id, &quest_id).await? {
            return Ok(MatchOutcome::Rejoined { room_id });
        }

        let rooms = self.rooms().await;
        let mut created: Option<Uuid> = None;

        for _attempt in 0..MATCH_ATTEMPTS {
            // The $lt filter makes the capacity check and the increment one
            // conditional write; losing the last slot simply misses the match.
            let claimed = rooms
                .find_one_and_update(
                    doc! {
                        "quest_id": &quest_id,
                        "status": "open",
                        "member_count": {"$lt": max_members as i64},
                    },
                    doc! {
                        "$inc": {"member_count": 1},
                        "$set": {"updated_at": DateTime::from_system_time(now)},
                    },
                )
                .sort(doc! {"created_at": 1})
                .return_document(ReturnDocument::After)
                .await
                .map_err(query_err(ROOM_COLLECTION))?;

            let Some(claimed) = claimed else {
                // Found no open room; found one. The partial unique index on
                // open rooms per quest collapses concurrent creators, and the
                // loser re-enters the loop to join the winner's room.
                let room = RoomEntity::new(quest_id.clone(), now);
                let room_id = room.id;
                match rooms.insert_one(MongoRoomDocument::from(room)).await {
                    Ok(_) => created = Some(room_id),
                    Err(err) if is_duplicate_key(&err) => {}
                    Err(source) => {
                        return Err(MongoDaoError::Write {
                            collection: ROOM_COLLECTION,
                            room_id,
                            source,
                        });
                    }
                }
                continue;
            };

            let room: RoomEntity = claimed.into();
            let membership = MembershipEntity {
                room_id: room.id,
                participant_id,
                country: country.clone(),
                joined_at: now,
                completed_ack_at: None,
            };
            match self
                .memberships()
                .await
                .insert_one(MongoMembershipDocument::from(membership))
                .await
            {
                Ok(_) => {}
                Err(err) if is_duplicate_key(&err) => {
                    // Raced against our own earlier membership; return the slot.
                    rooms
                        .update_one(doc_id(room.id), doc! {"$inc": {"member_count": -1}})
                        .await
                        .map_err(write_err(ROOM_COLLECTION, room.id))?;
                    return Ok(MatchOutcome::Rejoined { room_id: room.id });
                }
                Err(source) => {
                    return Err(MongoDaoError::Write {
                        collection: MEMBERSHIP_COLLECTION,
                        room_id: room.id,
                        source,
                    });
                }
            }

            // The join that reaches capacity also starts the session.
            let started = if room.member_count >= max_members {
                let result = rooms
                    .update_one(
                        doc! {"_id": uuid_as_binary(room.id), "status": "open"},
                        doc! {"$set": {
                            "status": "in_progress",
                            "current_round": 1,
                            "started_at": DateTime::from_system_time(now),
                            "updated_at": DateTime::from_system_time(now),
                        }},
                    )
                    .await
                    .map_err(write_err(ROOM_COLLECTION, room.id))?;
                result.modified_count > 0
            } else {
                false
            };

            return Ok(if created == Some(room.id) {
                MatchOutcome::Created { room_id: room.id }
            } else {
                MatchOutcome::Joined {
                    room_id: room.id,
                    started,
                }
            });
        }

        Err(MongoDaoError::MatchmakingRetries {
            quest_id,
            attempts: MATCH_ATTEMPTS,
        })
    }

    async fn record_vote(&self, vote: VoteEntity) -> MongoResult<VoteOutcome> {
        let Some(room) = self.find_room(vote.room_id).await? else {
            return Ok(VoteOutcome::RoomNotFound);
        };
        if self
            .find_membership(vote.room_id, vote.participant_id)
            .await?
            .is_none()
        {
            return Ok(VoteOutcome::NotAMember);
        }
        if room.status != RoomStatus::InProgress {
            return Ok(VoteOutcome::NotInProgress {
                status: room.status,
            });
        }
        if vote.round != room.current_round {
            return Ok(VoteOutcome::WrongRound {
                current: room.current_round,
            });
        }
        let committed = self
            .commits()
            .await
            .find_one(doc! {"room_id": uuid_as_binary(vote.room_id), "round": vote.round as i32})
            .await
            .map_err(query_err(COMMIT_COLLECTION))?;
        if committed.is_some() {
            return Ok(VoteOutcome::RoundCommitted);
        }

        let room_id = vote.room_id;
        let round = vote.round;
        let cast_at = vote.cast_at;
        let filter = doc! {
            "room_id": uuid_as_binary(vote.room_id),
            "participant_id": uuid_as_binary(vote.participant_id),
            "round": round as i32,
        };
        let previous = self
            .votes()
            .await
            .find_one_and_replace(filter.clone(), MongoVoteDocument::from(vote))
            .upsert(true)
            .await
            .map_err(write_err(VOTE_COLLECTION, room_id))?;

        // A commit may land between the pre-check and the upsert. Committed
        // rounds are immutable history, so when that happens the slot is put
        // back the way it was before reporting the commit.
        let committed = self
            .commits()
            .await
            .find_one(doc! {"room_id": uuid_as_binary(room_id), "round": round as i32})
            .await
            .map_err(query_err(COMMIT_COLLECTION))?;
        if committed.is_some() {
            let votes = self.votes().await;
            match previous {
                Some(previous) => {
                    votes
                        .replace_one(filter, previous)
                        .await
                        .map_err(write_err(VOTE_COLLECTION, room_id))?;
                }
                None => {
                    votes
                        .delete_one(filter)
                        .await
                        .map_err(write_err(VOTE_COLLECTION, room_id))?;
                }
            }
            return Ok(VoteOutcome::RoundCommitted);
        }

        self.rooms()
            .await
            .update_one(
                doc_id(room_id),
                doc! {"$set": {"updated_at": DateTime::from_system_time(cast_at)}},
            )
            .await
            .map_err(write_err(ROOM_COLLECTION, room_id))?;

        Ok(VoteOutcome::Recorded)
    }

    async fn insert_commit(&self, commit: CommitEntity) -> MongoResult<CommitOutcome> {
        let Some(room) = self.find_room(commit.room_id).await? else {
            return Ok(CommitOutcome::RoomNotFound);
        };
        if self
            .find_membership(commit.room_id, commit.committed_by)
            .await?
            .is_none()
        {
            return Ok(CommitOutcome::NotAMember);
        }

        let existing = self
            .commits()
            .await
            .find_one(
                doc! {"room_id": uuid_as_binary(commit.room_id), "round": commit.round as i32},
            )
            .await
            .map_err(query_err(COMMIT_COLLECTION))?;
        if existing.is_some() {
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let next = match session::advance(
            room.phase(),
            SessionEvent::CommitRound {
                round: commit.round,
            },
        ) {
            Ok(next) => next,
            Err(_) if room.status != RoomStatus::InProgress => {
                return Ok(CommitOutcome::NotInProgress {
                    status: room.status,
                });
            }
            Err(_) => {
                return Ok(CommitOutcome::WrongRound {
                    current: room.current_round,
                });
            }
        };

        // The unique (room_id, round) index is the arbiter of the race.
        let room_id = commit.room_id;
        let round = commit.round;
        let at = commit.committed_at;
        match self
            .commits()
            .await
            .insert_one(MongoCommitDocument::from(commit))
            .await
        {
            Ok(_) => {}
            Err(err) if is_duplicate_key(&err) => return Ok(CommitOutcome::AlreadyCommitted),
            Err(source) => {
                return Err(MongoDaoError::Write {
                    collection: COMMIT_COLLECTION,
                    room_id,
                    source,
                });
            }
        }

        let update = match next {
            SessionPhase::Voting { round: next_round } => doc! {"$set": {
                "current_round": next_round as i32,
                "updated_at": DateTime::from_system_time(at),
            }},
            _ => doc! {"$set": {
                "status": "completed",
                "completed_at": DateTime::from_system_time(at),
                "updated_at": DateTime::from_system_time(at),
            }},
        };
        let result = self
            .rooms()
            .await
            .update_one(
                doc! {
                    "_id": uuid_as_binary(room_id),
                    "status": "in_progress",
                    "current_round": round as i32,
                },
                update,
            )
            .await
            .map_err(write_err(ROOM_COLLECTION, room_id))?;
        if result.matched_count == 0 {
            // The commit insert won, so the room must still be on this round.
            warn!(%room_id, round, "room advance matched no document after commit insert");
        }

        Ok(CommitOutcome::Committed {
            completed: next == SessionPhase::Completed,
        })
    }

    async fn acknowledge_completion(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
        at: SystemTime,
    ) -> MongoResult<AckOutcome> {
        let Some(room) = self.find_room(room_id).await? else {
            return Ok(AckOutcome::RoomNotFound);
        };
        if room.status != RoomStatus::Completed {
            return Ok(AckOutcome::NotCompleted {
                status: room.status,
            });
        }
        if self.find_membership(room_id, participant_id).await?.is_none() {
            return Ok(AckOutcome::NotAMember);
        }

        // Repeats miss the null filter and stay no-ops.
        self.memberships()
            .await
            .update_one(
                doc! {
                    "room_id": uuid_as_binary(room_id),
                    "participant_id": uuid_as_binary(participant_id),
                    "completed_ack_at": Bson::Null,
                },
                doc! {"$set": {"completed_ack_at": DateTime::from_system_time(at)}},
            )
            .await
            .map_err(write_err(MEMBERSHIP_COLLECTION, room_id))?;

        let pending = self
            .memberships()
            .await
            .count_documents(doc! {
                "room_id": uuid_as_binary(room_id),
                "completed_ack_at": Bson::Null,
            })
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?;

        Ok(AckOutcome::Acknowledged {
            all_completed: pending == 0,
        })
    }

    async fn insert_artifact(&self, artifact: ArtifactEntity) -> MongoResult<ArtifactEntity> {
        let room_id = artifact.room_id;
        match self
            .artifacts()
            .await
            .insert_one(MongoArtifactDocument::from(artifact.clone()))
            .await
        {
            Ok(_) => Ok(artifact),
            Err(err) if is_duplicate_key(&err) => {
                // Lost the generation race; hand back the row that won.
                let existing = self
                    .artifacts()
                    .await
                    .find_one(doc! {"room_id": uuid_as_binary(room_id)})
                    .await
                    .map_err(query_err(ARTIFACT_COLLECTION))?;
                Ok(existing.map(Into::into).unwrap_or(artifact))
            }
            Err(source) => Err(MongoDaoError::Write {
                collection: ARTIFACT_COLLECTION,
                room_id,
                source,
            }),
        }
    }

    async fn insert_badge_award(&self, award: BadgeAwardEntity) -> MongoResult<bool> {
        let room_id = award.room_id.unwrap_or(Uuid::nil());
        match self
            .awards()
            .await
            .insert_one(MongoBadgeAwardDocument::from(award))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::Write {
                collection: AWARD_COLLECTION,
                room_id,
                source,
            }),
        }
    }

    async fn completed_room_count(&self, participant_id: Uuid) -> MongoResult<u64> {
        let room_ids = self.participant_room_ids(participant_id).await?;
        if room_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Bson> = room_ids
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();
        self.rooms()
            .await
            .count_documents(doc! {"_id": {"$in": ids}, "status": "completed"})
            .await
            .map_err(query_err(ROOM_COLLECTION))
    }

    async fn distinct_teammate_count(&self, participant_id: Uuid) -> MongoResult<u64> {
        let room_ids = self.participant_room_ids(participant_id).await?;
        if room_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Bson> = room_ids
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();
        let documents: Vec<MongoMembershipDocument> = self
            .memberships()
            .await
            .find(doc! {"room_id": {"$in": ids}})
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?;

        let teammates: HashSet<Uuid> = documents
            .into_iter()
            .map(|doc| doc.participant_id)
            .filter(|id| *id != participant_id)
            .collect();
        Ok(teammates.len() as u64)
    }

    async fn close_idle_rooms(&self, idle_since: SystemTime) -> MongoResult<Vec<Uuid>> {
        let cutoff = DateTime::from_system_time(idle_since);
        let rooms = self.rooms().await;
        let stale: Vec<MongoRoomDocument> = rooms
            .find(doc! {"status": "in_progress", "updated_at": {"$lt": cutoff}})
            .await
            .map_err(query_err(ROOM_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(ROOM_COLLECTION))?;

        let mut closed = Vec::new();
        for room in stale.into_iter().map(RoomEntity::from) {
            let result = rooms
                .update_one(
                    doc! {
                        "_id": uuid_as_binary(room.id),
                        "status": "in_progress",
                        "updated_at": {"$lt": cutoff},
                    },
                    doc! {"$set": {"status": "closed"}},
                )
                .await
                .map_err(write_err(ROOM_COLLECTION, room.id))?;
            if result.modified_count > 0 {
                closed.push(room.id);
            }
        }

        Ok(closed)
    }

    async fn members(&self, room_id: Uuid) -> MongoResult<Vec<MembershipEntity>> {
        let documents: Vec<MongoMembershipDocument> = self
            .memberships()
            .await
            .find(doc! {"room_id": uuid_as_binary(room_id)})
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(MEMBERSHIP_COLLECTION))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn votes_for(&self, room_id: Uuid) -> MongoResult<Vec<VoteEntity>> {
        let documents: Vec<MongoVoteDocument> = self
            .votes()
            .await
            .find(doc! {"room_id": uuid_as_binary(room_id)})
            .await
            .map_err(query_err(VOTE_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(VOTE_COLLECTION))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn commits_for(&self, room_id: Uuid) -> MongoResult<Vec<CommitEntity>> {
        let documents: Vec<MongoCommitDocument> = self
            .commits()
            .await
            .find(doc! {"room_id": uuid_as_binary(room_id)})
            .await
            .map_err(query_err(COMMIT_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(COMMIT_COLLECTION))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn badge_awards(&self, participant_id: Uuid) -> MongoResult<Vec<BadgeAwardEntity>> {
        let documents: Vec<MongoBadgeAwardDocument> = self
            .awards()
            .await
            .find(doc! {"participant_id": uuid_as_binary(participant_id)})
            .await
            .map_err(query_err(AWARD_COLLECTION))?
            .try_collect()
            .await
            .map_err(query_err(AWARD_COLLECTION))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_artifact(&self, room_id: Uuid) -> MongoResult<Option<ArtifactEntity>> {
        let document = self
            .artifacts()
            .await
            .find_one(doc! {"room_id": uuid_as_binary(room_id)})
            .await
            .map_err(query_err(ARTIFACT_COLLECTION))?;
        Ok(document.map(Into::into))
    }
}

impl RoomStore for MongoRoomStore {
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
                .map_err(Into::into)
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(id).await.map_err(Into::into) })
    }

    fn members(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MembershipEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.members(room_id).await.map_err(Into::into) })
    }

    fn votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<VoteEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.votes_for(room_id).await.map_err(Into::into) })
    }

    fn commits(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CommitEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.commits_for(room_id).await.map_err(Into::into) })
    }

    fn record_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<VoteOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.record_vote(vote).await.map_err(Into::into) })
    }

    fn insert_commit(
        &self,
        commit: CommitEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.insert_commit(commit).await.map_err(Into::into) })
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
                .map_err(Into::into)
        })
    }

    fn find_artifact(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ArtifactEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_artifact(room_id).await.map_err(Into::into) })
    }

    fn insert_artifact(
        &self,
        artifact: ArtifactEntity,
    ) -> BoxFuture<'static, StorageResult<ArtifactEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_artifact(artifact).await.map_err(Into::into) })
    }

    fn insert_badge_award(
        &self,
        award: BadgeAwardEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_badge_award(award).await.map_err(Into::into) })
    }

    fn badge_awards(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<BadgeAwardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.badge_awards(participant_id).await.map_err(Into::into) })
    }

    fn completed_room_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .completed_room_count(participant_id)
                .await
                .map_err(Into::into)
        })
    }

    fn distinct_teammate_count(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .distinct_teammate_count(participant_id)
                .await
                .map_err(Into::into)
        })
    }

    fn close_idle_rooms(
        &self,
        idle_since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.close_idle_rooms(idle_since).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
