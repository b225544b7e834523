use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::session::ROUND_COUNT;

/// Number of options every decision must carry, keyed `A`/`B`/`C`.
pub const OPTIONS_PER_DECISION: usize = 3;

/// Label of one of the three options of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OptionKey {
    /// First option.
    A,
    /// Second option.
    B,
    /// Third option.
    C,
}

impl OptionKey {
    /// All option keys in display order.
    pub const ALL: [OptionKey; OPTIONS_PER_DECISION] = [OptionKey::A, OptionKey::B, OptionKey::C];
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
        };
        f.write_str(label)
    }
}

/// Whether a quest is designed for a single participant or a full team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestMode {
    /// Playable alone or in a duo.
    Solo,
    /// Designed for a team of three or more.
    Team,
}

/// One selectable option of a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOption {
    /// Label under which the option is voted and committed.
    pub key: OptionKey,
    /// What choosing this option means.
    pub description: String,
    /// Immediate consequence of the choice.
    pub impact: String,
    /// What the team gives up by choosing it.
    pub tradeoff: String,
}

/// One structured decision of a quest script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Short decision title.
    pub title: String,
    /// Narrative context presented before voting.
    pub context: String,
    /// The three options, keyed `A`/`B`/`C`.
    pub options: Vec<DecisionOption>,
}

impl Decision {
    /// Look up an option of this decision by its key.
    pub fn option(&self, key: OptionKey) -> Option<&DecisionOption> {
        self.options.iter().find(|option| option.key == key)
    }
}

/// Immutable decision script for one quest, loaded and validated once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    /// Stable identifier used by matchmaking.
    pub id: String,
    /// Display title of the quest.
    pub title: String,
    /// Team or solo oriented script.
    pub mode: QuestMode,
    /// Minimum room capacity declared by the script.
    pub min_members: u32,
    /// Maximum room capacity; joins beyond this are rejected.
    pub max_members: u32,
    /// The ordered decisions, exactly one per round.
    pub decisions: Vec<Decision>,
}

/// Structural problems detected while validating a quest script.
#[derive(Debug, Error)]
pub enum QuestScriptError {
    /// Quest identifier is empty.
    #[error("quest id must not be empty")]
    EmptyId,
    /// The script does not carry exactly [`ROUND_COUNT`] decisions.
    #[error("quest `{id}` must have exactly {expected} decisions (got {got})")]
    DecisionCount {
        /// Quest identifier.
        id: String,
        /// Required decision count.
        expected: u8,
        /// Decisions actually present.
        got: usize,
    },
    /// A decision does not carry exactly the `A`/`B`/`C` options.
    #[error("quest `{id}` decision {index} must have options A, B and C")]
    OptionKeys {
        /// Quest identifier.
        id: String,
        /// Zero-based decision index.
        index: usize,
    },
    /// Capacity bounds are inconsistent.
    #[error("quest `{id}` capacity bounds are invalid (min {min}, max {max})")]
    Capacity {
        /// Quest identifier.
        id: String,
        /// Declared minimum.
        min: u32,
        /// Declared maximum.
        max: u32,
    },
}

impl Quest {
    /// Validate the structural invariants of the script.
    ///
    /// Scripts are assumed to arrive already validated from the content
    /// pipeline; this is the last line of defense at catalog load.
    pub fn validate(&self) -> Result<(), QuestScriptError> {
        if self.id.trim().is_empty() {
            return Err(QuestScriptError::EmptyId);
        }

        if self.decisions.len() != ROUND_COUNT as usize {
            return Err(QuestScriptError::DecisionCount {
                id: self.id.clone(),
                expected: ROUND_COUNT,
                got: self.decisions.len(),
            });
        }

        for (index, decision) in self.decisions.iter().enumerate() {
            let keys_ok = decision.options.len() == OPTIONS_PER_DECISION
                && OptionKey::ALL
                    .iter()
                    .all(|key| decision.option(*key).is_some());
            if !keys_ok {
                return Err(QuestScriptError::OptionKeys {
                    id: self.id.clone(),
                    index,
                });
            }
        }

        if self.min_members == 0 || self.min_members > self.max_members {
            return Err(QuestScriptError::Capacity {
                id: self.id.clone(),
                min: self.min_members,
                max: self.max_members,
            });
        }

        Ok(())
    }

    /// The decision voted on during `round` (1-based), if the round is valid.
    pub fn decision(&self, round: u8) -> Option<&Decision> {
        if round == 0 {
            return None;
        }
        self.decisions.get(round as usize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(key: OptionKey) -> DecisionOption {
        DecisionOption {
            key,
            description: format!("option {key}"),
            impact: "impact".into(),
            tradeoff: "tradeoff".into(),
        }
    }

    fn decision() -> Decision {
        Decision {
            title: "A decision".into(),
            context: "Some context".into(),
            options: OptionKey::ALL.iter().copied().map(option).collect(),
        }
    }

    fn quest() -> Quest {
        Quest {
            id: "outage-drill".into(),
            title: "Outage Drill".into(),
            mode: QuestMode::Team,
            min_members: 2,
            max_members: 3,
            decisions: vec![decision(), decision(), decision()],
        }
    }

    #[test]
    fn valid_script_passes() {
        assert!(quest().validate().is_ok());
    }

    #[test]
    fn wrong_decision_count_is_rejected() {
        let mut bad = quest();
        bad.decisions.pop();
        assert!(matches!(
            bad.validate(),
            Err(QuestScriptError::DecisionCount { got: 2, .. })
        ));
    }

    #[test]
    fn duplicate_option_keys_are_rejected() {
        let mut bad = quest();
        bad.decisions[1].options[2].key = OptionKey::A;
        assert!(matches!(
            bad.validate(),
            Err(QuestScriptError::OptionKeys { index: 1, .. })
        ));
    }

    #[test]
    fn capacity_bounds_are_checked() {
        let mut bad = quest();
        bad.min_members = 4;
        assert!(matches!(
            bad.validate(),
            Err(QuestScriptError::Capacity { min: 4, max: 3, .. })
        ));
    }

    #[test]
    fn decision_lookup_is_one_based() {
        let quest = quest();
        assert!(quest.decision(0).is_none());
        assert!(quest.decision(1).is_some());
        assert!(quest.decision(3).is_some());
        assert!(quest.decision(4).is_none());
    }
}
