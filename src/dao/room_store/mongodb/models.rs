use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        ArtifactEntity, BadgeAwardEntity, BadgeKind, CommitEntity, MembershipEntity, RoomEntity,
        RoomStatus, VoteEntity,
    },
    state::quest::OptionKey,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    quest_id: String,
    status: RoomStatus,
    current_round: u8,
    member_count: u32,
    created_at: DateTime,
    updated_at: DateTime,
    started_at: Option<DateTime>,
    completed_at: Option<DateTime>,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            id: value.id,
            quest_id: value.quest_id,
            status: value.status,
            current_round: value.current_round,
            member_count: value.member_count,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            started_at: value.started_at.map(DateTime::from_system_time),
            completed_at: value.completed_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoRoomDocument> for RoomEntity {
    fn from(value: MongoRoomDocument) -> Self {
        Self {
            id: value.id,
            quest_id: value.quest_id,
            status: value.status,
            current_round: value.current_round,
            member_count: value.member_count,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            started_at: value.started_at.map(|at| at.to_system_time()),
            completed_at: value.completed_at.map(|at| at.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMembershipDocument {
    pub room_id: Uuid,
    pub participant_id: Uuid,
    country: Option<String>,
    joined_at: DateTime,
    completed_ack_at: Option<DateTime>,
}

impl From<MembershipEntity> for MongoMembershipDocument {
    fn from(value: MembershipEntity) -> Self {
        Self {
            room_id: value.room_id,
            participant_id: value.participant_id,
            country: value.country,
            joined_at: DateTime::from_system_time(value.joined_at),
            completed_ack_at: value.completed_ack_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoMembershipDocument> for MembershipEntity {
    fn from(value: MongoMembershipDocument) -> Self {
        Self {
            room_id: value.room_id,
            participant_id: value.participant_id,
            country: value.country,
            joined_at: value.joined_at.to_system_time(),
            completed_ack_at: value.completed_ack_at.map(|at| at.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVoteDocument {
    room_id: Uuid,
    participant_id: Uuid,
    round: u8,
    option: OptionKey,
    justification: String,
    cast_at: DateTime,
}

impl From<VoteEntity> for MongoVoteDocument {
    fn from(value: VoteEntity) -> Self {
        Self {
            room_id: value.room_id,
            participant_id: value.participant_id,
            round: value.round,
            option: value.option,
            justification: value.justification,
            cast_at: DateTime::from_system_time(value.cast_at),
        }
    }
}

impl From<MongoVoteDocument> for VoteEntity {
    fn from(value: MongoVoteDocument) -> Self {
        Self {
            room_id: value.room_id,
            participant_id: value.participant_id,
            round: value.round,
            option: value.option,
            justification: value.justification,
            cast_at: value.cast_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCommitDocument {
    room_id: Uuid,
    round: u8,
    option: OptionKey,
    committed_by: Uuid,
    committed_at: DateTime,
}

impl From<CommitEntity> for MongoCommitDocument {
    fn from(value: CommitEntity) -> Self {
        Self {
            room_id: value.room_id,
            round: value.round,
            option: value.option,
            committed_by: value.committed_by,
            committed_at: DateTime::from_system_time(value.committed_at),
        }
    }
}

impl From<MongoCommitDocument> for CommitEntity {
    fn from(value: MongoCommitDocument) -> Self {
        Self {
            room_id: value.room_id,
            round: value.round,
            option: value.option,
            committed_by: value.committed_by,
            committed_at: value.committed_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoArtifactDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    room_id: Uuid,
    quest_id: String,
    title: String,
    content: String,
    created_at: DateTime,
}

impl From<ArtifactEntity> for MongoArtifactDocument {
    fn from(value: ArtifactEntity) -> Self {
        Self {
            id: value.id,
            room_id: value.room_id,
            quest_id: value.quest_id,
            title: value.title,
            content: value.content,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoArtifactDocument> for ArtifactEntity {
    fn from(value: MongoArtifactDocument) -> Self {
        Self {
            id: value.id,
            room_id: value.room_id,
            quest_id: value.quest_id,
            title: value.title,
            content: value.content,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBadgeAwardDocument {
    participant_id: Uuid,
    kind: BadgeKind,
    room_id: Option<Uuid>,
    awarded_at: DateTime,
}

impl From<BadgeAwardEntity> for MongoBadgeAwardDocument {
    fn from(value: BadgeAwardEntity) -> Self {
        Self {
            participant_id: value.participant_id,
            kind: value.kind,
            room_id: value.room_id,
            awarded_at: DateTime::from_system_time(value.awarded_at),
        }
    }
}

impl From<MongoBadgeAwardDocument> for BadgeAwardEntity {
    fn from(value: MongoBadgeAwardDocument) -> Self {
        Self {
            participant_id: value.participant_id,
            kind: value.kind,
            room_id: value.room_id,
            awarded_at: value.awarded_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
