use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    quest::{Decision, DecisionOption, OptionKey, Quest, QuestMode},
    session::ROUND_COUNT,
};

/// Response payload listing the quests open for matchmaking.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestsResponse {
    pub quests: Vec<QuestSummary>,
}

/// Public projection of a quest exposed to REST clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestSummary {
    pub id: String,
    pub title: String,
    pub mode: QuestMode,
    pub min_members: u32,
    pub max_members: u32,
    pub rounds: u8,
}

impl From<&Quest> for QuestSummary {
    fn from(quest: &Quest) -> Self {
        Self {
            id: quest.id.clone(),
            title: quest.title.clone(),
            mode: quest.mode,
            min_members: quest.min_members,
            max_members: quest.max_members,
            rounds: ROUND_COUNT,
        }
    }
}

/// Decision script for the round a room is currently voting on.
#[derive(Debug, Serialize, ToSchema)]
pub struct DecisionSummary {
    pub title: String,
    pub context: String,
    pub options: Vec<DecisionOptionSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecisionOptionSummary {
    pub key: OptionKey,
    pub description: String,
    pub impact: String,
    pub tradeoff: String,
}

impl From<&Decision> for DecisionSummary {
    fn from(decision: &Decision) -> Self {
        Self {
            title: decision.title.clone(),
            context: decision.context.clone(),
            options: decision.options.iter().map(Into::into).collect(),
        }
    }
}

impl From<&DecisionOption> for DecisionOptionSummary {
    fn from(option: &DecisionOption) -> Self {
        Self {
            key: option.key,
            description: option.description.clone(),
            impact: option.impact.clone(),
            tradeoff: option.tradeoff.clone(),
        }
    }
}
