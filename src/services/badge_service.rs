//! Achievement evaluation for completed rooms.
//!
//! Evaluation is dispatched fire-and-forget from the final commit and from
//! artifact generation, so it must tolerate running several times for the same
//! room: every award lands through an insert-if-absent write keyed by
//! (participant, kind, room scope).

use std::{collections::HashSet, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{BadgeAwardEntity, BadgeKind, RoomStatus, VoteEntity},
    dto::badge::BadgesResponse,
    error::ServiceError,
    state::{SharedState, quest::QuestMode, session::ROUND_COUNT},
};

/// Completed quests needed for [`BadgeKind::QuestMaster`].
const QUEST_MASTER_THRESHOLD: u64 = 5;
/// Distinct teammates needed for [`BadgeKind::SocialButterfly`].
const SOCIAL_BUTTERFLY_THRESHOLD: u64 = 10;
/// Members needed in a team-mode room for [`BadgeKind::TeamPlayer`].
const TEAM_PLAYER_MIN_MEMBERS: usize = 3;
/// Justification length, in characters, needed every round for [`BadgeKind::Storyteller`].
const STORYTELLER_MIN_CHARS: usize = 80;
/// Distinct member countries needed for [`BadgeKind::WorldlyCrew`].
const WORLDLY_CREW_MIN_COUNTRIES: usize = 3;

/// Display metadata for an achievement, looked up from the static catalog.
#[derive(Debug, Clone, Copy)]
pub struct BadgeMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: &'static str,
}

impl BadgeKind {
    /// Static display metadata for this achievement.
    pub fn metadata(&self) -> BadgeMetadata {
        match self {
            BadgeKind::FirstQuest => BadgeMetadata {
                name: "First Quest",
                description: "Completed a quest for the first time",
                rarity: "common",
            },
            BadgeKind::QuestMaster => BadgeMetadata {
                name: "Quest Master",
                description: "Completed five quests",
                rarity: "rare",
            },
            BadgeKind::SocialButterfly => BadgeMetadata {
                name: "Social Butterfly",
                description: "Shared rooms with ten distinct teammates",
                rarity: "rare",
            },
            BadgeKind::TeamPlayer => BadgeMetadata {
                name: "Team Player",
                description: "Completed a team quest with three or more members",
                rarity: "common",
            },
            BadgeKind::DedicatedVoter => BadgeMetadata {
                name: "Dedicated Voter",
                description: "Voted in every round of a quest",
                rarity: "common",
            },
            BadgeKind::Storyteller => BadgeMetadata {
                name: "Storyteller",
                description: "Wrote a rich justification in every round",
                rarity: "uncommon",
            },
            BadgeKind::Decider => BadgeMetadata {
                name: "Decider",
                description: "Committed the final decision of a quest",
                rarity: "uncommon",
            },
            BadgeKind::Chronicler => BadgeMetadata {
                name: "Chronicler",
                description: "Saw a quest through to its written chronicle",
                rarity: "common",
            },
            BadgeKind::TeamSpirit => BadgeMetadata {
                name: "Team Spirit",
                description: "Every member voted and every round was committed",
                rarity: "uncommon",
            },
            BadgeKind::Unanimous => BadgeMetadata {
                name: "Unanimous",
                description: "The whole room agreed on a decision",
                rarity: "uncommon",
            },
            BadgeKind::WorldlyCrew => BadgeMetadata {
                name: "Worldly Crew",
                description: "Quested with members from three countries",
                rarity: "rare",
            },
        }
    }
}

/// Schedule an evaluation for a room without blocking the caller.
///
/// Failures are logged and never surface to the participant-facing request.
pub fn dispatch(state: SharedState, room_id: Uuid) {
    tokio::spawn(async move {
        if let Err(err) = evaluate(&state, room_id).await {
            warn!(%room_id, error = %err, "badge evaluation failed");
        }
    });
}

/// Evaluate every achievement predicate for a completed room.
pub async fn evaluate(state: &SharedState, room_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(room_id).await? else {
        debug!(%room_id, "skipping badge evaluation, room is gone");
        return Ok(());
    };
    if room.status != RoomStatus::Completed {
        debug!(%room_id, status = ?room.status, "skipping badge evaluation, room not completed");
        return Ok(());
    }

    let team_mode = state
        .config()
        .quest(&room.quest_id)
        .is_some_and(|quest| quest.mode == QuestMode::Team);

    let members = store.members(room_id).await?;
    let votes = store.votes(room_id).await?;
    let commits = store.commits(room_id).await?;
    let artifact_exists = store.find_artifact(room_id).await?.is_some();
    let now = SystemTime::now();

    let vote_of = |participant: Uuid, round: u8| -> Option<&VoteEntity> {
        votes
            .iter()
            .find(|vote| vote.participant_id == participant && vote.round == round)
    };

    let all_rounds_committed =
        (1..=ROUND_COUNT).all(|round| commits.iter().any(|commit| commit.round == round));
    let everyone_voted_every_round = (1..=ROUND_COUNT).all(|round| {
        members
            .iter()
            .all(|member| vote_of(member.participant_id, round).is_some())
    });
    let some_round_unanimous = (1..=ROUND_COUNT).any(|round| {
        let mut options = members
            .iter()
            .map(|member| vote_of(member.participant_id, round).map(|vote| vote.option));
        match options.next().flatten() {
            Some(first) => options.all(|option| option == Some(first)),
            None => false,
        }
    });
    let countries: HashSet<&str> = members
        .iter()
        .filter_map(|member| member.country.as_deref())
        .collect();
    let worldly = countries.len() >= WORLDLY_CREW_MIN_COUNTRIES;
    let final_committer = commits
        .iter()
        .find(|commit| commit.round == ROUND_COUNT)
        .map(|commit| commit.committed_by);

    for member in &members {
        let participant = member.participant_id;
        let mut earned: Vec<(BadgeKind, Option<Uuid>)> = Vec::new();

        // Career-wide scans recompute counts across the participant's history.
        let completed = store.completed_room_count(participant).await?;
        if completed >= 1 {
            earned.push((BadgeKind::FirstQuest, None));
        }
        if completed >= QUEST_MASTER_THRESHOLD {
            earned.push((BadgeKind::QuestMaster, None));
        }
        if store.distinct_teammate_count(participant).await? >= SOCIAL_BUTTERFLY_THRESHOLD {
            earned.push((BadgeKind::SocialButterfly, None));
        }

        if team_mode && members.len() >= TEAM_PLAYER_MIN_MEMBERS {
            earned.push((BadgeKind::TeamPlayer, Some(room_id)));
        }
        if (1..=ROUND_COUNT).all(|round| vote_of(participant, round).is_some()) {
            earned.push((BadgeKind::DedicatedVoter, Some(room_id)));
        }
        if (1..=ROUND_COUNT).all(|round| {
            vote_of(participant, round)
                .is_some_and(|vote| vote.justification.chars().count() >= STORYTELLER_MIN_CHARS)
        }) {
            earned.push((BadgeKind::Storyteller, Some(room_id)));
        }
        if final_committer == Some(participant) {
            earned.push((BadgeKind::Decider, Some(room_id)));
        }
        if artifact_exists {
            earned.push((BadgeKind::Chronicler, Some(room_id)));
        }
        if everyone_voted_every_round && all_rounds_committed {
            earned.push((BadgeKind::TeamSpirit, Some(room_id)));
        }
        if some_round_unanimous {
            earned.push((BadgeKind::Unanimous, Some(room_id)));
        }
        if worldly {
            earned.push((BadgeKind::WorldlyCrew, Some(room_id)));
        }

        for (kind, scope) in earned {
            let award = BadgeAwardEntity {
                participant_id: participant,
                kind,
                room_id: scope,
                awarded_at: now,
            };
            if store.insert_badge_award(award).await? {
                info!(%participant, ?kind, %room_id, "badge awarded");
            }
        }
    }

    Ok(())
}

/// Every badge a participant has earned, with display metadata attached.
pub async fn badges(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<BadgesResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let badges = store
        .badge_awards(participant_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(BadgesResponse {
        participant_id,
        badges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::room::{AcknowledgeRequest, VoteRequest},
        services::{completion_service, session_service, test_support},
        state::quest::OptionKey,
    };

    async fn completed_solo_room(state: &SharedState, participant: Uuid) -> Uuid {
        let room_id = test_support::join(state, participant, "solo").await;
        test_support::commit_all_rounds(state, room_id, participant).await;
        room_id
    }

    async fn kinds_for(state: &SharedState, participant: Uuid) -> Vec<BadgeKind> {
        badges(state, participant)
            .await
            .expect("badges")
            .badges
            .into_iter()
            .map(|badge| badge.kind)
            .collect()
    }

    #[tokio::test]
    async fn first_completion_earns_first_quest_only() {
        let state =
            test_support::state_with(vec![test_support::quest("solo", QuestMode::Solo, 1, 1)])
                .await;
        let participant = Uuid::new_v4();
        let room_id = completed_solo_room(&state, participant).await;

        evaluate(&state, room_id).await.expect("evaluate");

        let kinds = kinds_for(&state, participant).await;
        assert!(kinds.contains(&BadgeKind::FirstQuest));
        assert!(!kinds.contains(&BadgeKind::QuestMaster));
        assert!(!kinds.contains(&BadgeKind::TeamPlayer));
    }

    #[tokio::test]
    async fn quest_master_lands_once_even_under_concurrent_evaluation() {
        let state =
            test_support::state_with(vec![test_support::quest("solo", QuestMode::Solo, 1, 1)])
                .await;
        let participant = Uuid::new_v4();

        let mut last_room = None;
        for _ in 0..5 {
            last_room = Some(completed_solo_room(&state, participant).await);
        }
        let last_room = last_room.expect("rooms completed");

        let (left, right) = tokio::join!(
            evaluate(&state, last_room),
            evaluate(&state, last_room),
        );
        left.expect("left evaluation");
        right.expect("right evaluation");

        let masters = kinds_for(&state, participant)
            .await
            .into_iter()
            .filter(|kind| *kind == BadgeKind::QuestMaster)
            .count();
        assert_eq!(masters, 1);
    }

    #[tokio::test]
    async fn storyteller_requires_a_rich_justification_every_round() {
        let state =
            test_support::state_with(vec![test_support::quest("solo", QuestMode::Solo, 1, 1)])
                .await;
        let participant = Uuid::new_v4();
        let room_id = test_support::join(&state, participant, "solo").await;

        let long = "x".repeat(STORYTELLER_MIN_CHARS);
        for round in 1..=ROUND_COUNT {
            // Round 2 gets a short justification, breaking the streak.
            let justification = if round == 2 { "meh".to_owned() } else { long.clone() };
            session_service::cast_vote(
                &state,
                room_id,
                VoteRequest {
                    participant_id: participant,
                    round,
                    option: OptionKey::A,
                    justification: Some(justification),
                },
            )
            .await
            .expect("vote");
            session_service::commit_round(
                &state,
                room_id,
                crate::dto::room::CommitRequest {
                    participant_id: participant,
                    round,
                    option: OptionKey::A,
                },
            )
            .await
            .expect("commit");
        }

        evaluate(&state, room_id).await.expect("evaluate");

        let kinds = kinds_for(&state, participant).await;
        assert!(!kinds.contains(&BadgeKind::Storyteller));
        // Voting in every round and agreeing with yourself still count.
        assert!(kinds.contains(&BadgeKind::DedicatedVoter));
        assert!(kinds.contains(&BadgeKind::Unanimous));
        assert!(kinds.contains(&BadgeKind::Decider));
    }

    #[tokio::test]
    async fn chronicler_waits_for_the_artifact() {
        let state =
            test_support::state_with(vec![test_support::quest("solo", QuestMode::Solo, 1, 1)])
                .await;
        let participant = Uuid::new_v4();
        let room_id = completed_solo_room(&state, participant).await;

        evaluate(&state, room_id).await.expect("evaluate");
        assert!(!kinds_for(&state, participant).await.contains(&BadgeKind::Chronicler));

        completion_service::acknowledge(
            &state,
            room_id,
            AcknowledgeRequest {
                participant_id: participant,
            },
        )
        .await
        .expect("ack");

        evaluate(&state, room_id).await.expect("evaluate again");
        assert!(kinds_for(&state, participant).await.contains(&BadgeKind::Chronicler));
    }

    #[tokio::test]
    async fn evaluation_skips_rooms_that_are_not_completed() {
        let state =
            test_support::state_with(vec![test_support::quest("duo", QuestMode::Team, 2, 2)])
                .await;
        let participant = Uuid::new_v4();
        let room_id = test_support::join(&state, participant, "duo").await;

        evaluate(&state, room_id).await.expect("evaluate");
        assert!(kinds_for(&state, participant).await.is_empty());
    }
}
