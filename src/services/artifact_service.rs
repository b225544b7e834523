//! Artifact assembly for completed rooms.
//!
//! The generator gathers the room's full decision history into an
//! [`ArtifactBundle`], hands it to a formatter, and inserts the rendered
//! document with an insert-if-absent write so concurrent triggers agree on a
//! single artifact row.

use std::{fmt::Write as _, sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        models::{
            ArtifactEntity, CommitEntity, MembershipEntity, RoomEntity, RoomStatus, VoteEntity,
        },
        room_store::RoomStore,
    },
    error::ServiceError,
    state::{
        SharedState,
        quest::{OptionKey, Quest},
        session::ROUND_COUNT,
    },
};

/// Everything a formatter needs to render a completed room.
pub struct ArtifactBundle {
    pub room: RoomEntity,
    pub quest: Quest,
    pub members: Vec<MembershipEntity>,
    pub votes: Vec<VoteEntity>,
    pub commits: Vec<CommitEntity>,
}

impl ArtifactBundle {
    /// Commit for a given 1-based round.
    pub fn commit(&self, round: u8) -> Option<&CommitEntity> {
        self.commits.iter().find(|commit| commit.round == round)
    }

    /// Votes cast in a given 1-based round.
    pub fn votes_in_round(&self, round: u8) -> impl Iterator<Item = &VoteEntity> {
        self.votes.iter().filter(move |vote| vote.round == round)
    }
}

/// Renders an [`ArtifactBundle`] into a document body.
pub trait ArtifactFormatter: Send + Sync {
    fn title(&self, bundle: &ArtifactBundle) -> String;
    fn render(&self, bundle: &ArtifactBundle) -> Result<String, ServiceError>;
}

/// Default formatter producing a Markdown chronicle of the session.
pub struct MarkdownFormatter;

impl ArtifactFormatter for MarkdownFormatter {
    fn title(&self, bundle: &ArtifactBundle) -> String {
        format!("{} — Chronicle", bundle.quest.title)
    }

    fn render(&self, bundle: &ArtifactBundle) -> Result<String, ServiceError> {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.title(bundle));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "A party of {} faced {} decisions.",
            bundle.members.len(),
            ROUND_COUNT
        );

        let mut roster: Vec<&MembershipEntity> = bundle.members.iter().collect();
        roster.sort_by_key(|member| member.joined_at);
        let _ = writeln!(out);
        let _ = writeln!(out, "## The party");
        let _ = writeln!(out);
        for member in roster {
            match &member.country {
                Some(country) => {
                    let _ = writeln!(out, "- `{}` ({country})", member.participant_id);
                }
                None => {
                    let _ = writeln!(out, "- `{}`", member.participant_id);
                }
            }
        }

        for round in 1..=ROUND_COUNT {
            let decision = bundle.quest.decision(round).ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "quest `{}` has no decision for round {round}",
                    bundle.quest.id
                ))
            })?;
            let commit = bundle.commit(round).ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "room `{}` is completed but round {round} has no commit",
                    bundle.room.id
                ))
            })?;
            let chosen = decision.option(commit.option).ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "quest `{}` round {round} has no option {}",
                    bundle.quest.id, commit.option
                ))
            })?;

            let _ = writeln!(out);
            let _ = writeln!(out, "## Round {round}: {}", decision.title);
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", decision.context);
            let _ = writeln!(out);
            let _ = writeln!(out, "**Chosen ({}):** {}", commit.option, chosen.description);
            let _ = writeln!(out, "- Impact: {}", chosen.impact);
            let _ = writeln!(out, "- Tradeoff: {}", chosen.tradeoff);

            let tally: Vec<String> = OptionKey::ALL
                .iter()
                .filter_map(|key| {
                    let count = bundle
                        .votes_in_round(round)
                        .filter(|vote| vote.option == *key)
                        .count();
                    (count > 0).then(|| format!("{key}×{count}"))
                })
                .collect();
            if !tally.is_empty() {
                let _ = writeln!(out, "- Votes: {}", tally.join(", "));
            }

            let mut justified: Vec<&VoteEntity> = bundle
                .votes_in_round(round)
                .filter(|vote| !vote.justification.is_empty())
                .collect();
            justified.sort_by_key(|vote| vote.cast_at);
            if !justified.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Voices from the room:");
                for vote in justified {
                    let _ = writeln!(out, "> ({}) {}", vote.option, vote.justification);
                }
            }
        }

        Ok(out)
    }
}

/// Assemble and persist the artifact for a completed room.
///
/// Safe to invoke multiple times: the storage insert is conditional on the
/// room, and every caller gets the row that actually won.
pub async fn generate(
    state: &SharedState,
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
) -> Result<ArtifactEntity, ServiceError> {
    if let Some(existing) = store.find_artifact(room_id).await? {
        return Ok(existing);
    }

    let Some(room) = store.find_room(room_id).await? else {
        return Err(ServiceError::NotFound(format!("room `{room_id}` not found")));
    };
    if room.status != RoomStatus::Completed {
        return Err(ServiceError::InvalidState(format!(
            "room is {:?}, artifacts are generated for completed rooms only",
            room.status
        )));
    }
    let quest = state
        .config()
        .quest(&room.quest_id)
        .ok_or_else(|| {
            ServiceError::Integrity(format!(
                "room `{room_id}` references unknown quest `{}`",
                room.quest_id
            ))
        })?
        .clone();

    let bundle = ArtifactBundle {
        members: store.members(room_id).await?,
        votes: store.votes(room_id).await?,
        commits: store.commits(room_id).await?,
        room,
        quest,
    };

    let formatter = MarkdownFormatter;
    let artifact = ArtifactEntity {
        id: Uuid::new_v4(),
        room_id,
        quest_id: bundle.quest.id.clone(),
        title: formatter.title(&bundle),
        content: formatter.render(&bundle)?,
        created_at: SystemTime::now(),
    };

    Ok(store.insert_artifact(artifact).await?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{services::test_support, state::quest::QuestMode};

    fn completed_bundle() -> ArtifactBundle {
        let quest = test_support::quest("trio", QuestMode::Team, 2, 3);
        let now = SystemTime::now();
        let mut room = RoomEntity::new(quest.id.clone(), now);
        room.status = RoomStatus::Completed;
        room.current_round = ROUND_COUNT;
        room.member_count = 2;

        let member = |country: Option<&str>, joined_at| MembershipEntity {
            room_id: room.id,
            participant_id: Uuid::new_v4(),
            country: country.map(str::to_owned),
            joined_at,
            completed_ack_at: None,
        };
        let members = vec![
            member(Some("FR"), now),
            member(None, now + Duration::from_secs(1)),
        ];

        let votes = (1..=ROUND_COUNT)
            .flat_map(|round| {
                [
                    VoteEntity {
                        room_id: room.id,
                        participant_id: members[0].participant_id,
                        round,
                        option: OptionKey::A,
                        justification: "hold the line".into(),
                        cast_at: now,
                    },
                    VoteEntity {
                        room_id: room.id,
                        participant_id: members[1].participant_id,
                        round,
                        option: OptionKey::B,
                        justification: String::new(),
                        cast_at: now,
                    },
                ]
            })
            .collect();
        let commits = (1..=ROUND_COUNT)
            .map(|round| CommitEntity {
                room_id: room.id,
                round,
                option: OptionKey::A,
                committed_by: members[0].participant_id,
                committed_at: now,
            })
            .collect();

        ArtifactBundle {
            room,
            quest,
            members,
            votes,
            commits,
        }
    }

    #[test]
    fn chronicle_lists_roster_tally_and_voices() {
        let bundle = completed_bundle();
        let content = MarkdownFormatter.render(&bundle).expect("render");

        assert!(content.contains("## The party"));
        for member in &bundle.members {
            assert!(content.contains(&member.participant_id.to_string()));
        }
        assert!(content.contains("(FR)"));
        assert!(content.contains("- Votes: A×1, B×1"));
        assert!(content.contains("> (A) hold the line"));
    }

    #[test]
    fn render_rejects_a_completed_room_with_a_missing_commit() {
        let mut bundle = completed_bundle();
        bundle.commits.pop();

        let err = MarkdownFormatter
            .render(&bundle)
            .expect_err("round without a commit");
        assert!(matches!(err, ServiceError::Integrity(_)));
    }
}
