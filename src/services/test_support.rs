//! Helpers shared by the service-layer test modules.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::room_store::memory::MemoryRoomStore,
    dto::room::{CommitRequest, JoinRequest},
    services::{matchmaking_service, session_service},
    state::{
        AppState, SharedState,
        quest::{Decision, DecisionOption, OptionKey, Quest, QuestMode},
        session::ROUND_COUNT,
    },
};

/// Build a minimal but valid quest script.
pub fn quest(id: &str, mode: QuestMode, min_members: u32, max_members: u32) -> Quest {
    let decisions = (1..=ROUND_COUNT)
        .map(|round| Decision {
            title: format!("Decision {round}"),
            context: format!("Context for decision {round}"),
            options: OptionKey::ALL
                .into_iter()
                .map(|key| DecisionOption {
                    key,
                    description: format!("Option {key}"),
                    impact: format!("Impact of {key}"),
                    tradeoff: format!("Tradeoff of {key}"),
                })
                .collect(),
        })
        .collect();

    let quest = Quest {
        id: id.to_owned(),
        title: format!("Quest {id}"),
        mode,
        min_members,
        max_members,
        decisions,
    };
    quest.validate().expect("test quest must be valid");
    quest
}

/// Shared state backed by a fresh in-memory store.
pub async fn state_with(quests: Vec<Quest>) -> SharedState {
    let state = AppState::new(AppConfig::with_quests(quests));
    state
        .install_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
    state
}

/// Join a quest and return the assigned room id.
pub async fn join(state: &SharedState, participant: Uuid, quest_id: &str) -> Uuid {
    matchmaking_service::join(
        state,
        JoinRequest {
            participant_id: participant,
            quest_id: quest_id.to_owned(),
            country: None,
        },
    )
    .await
    .expect("join")
    .room_id
}

/// Drive a room through all rounds; quorum is advisory so votes are optional.
pub async fn commit_all_rounds(state: &SharedState, room_id: Uuid, committer: Uuid) {
    for round in 1..=ROUND_COUNT {
        session_service::commit_round(
            state,
            room_id,
            CommitRequest {
                participant_id: committer,
                round,
                option: OptionKey::A,
            },
        )
        .await
        .expect("commit");
    }
}
