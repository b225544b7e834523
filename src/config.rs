//! Application-level configuration loading, including the runtime quest catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::quest::{Decision, DecisionOption, OptionKey, Quest, QuestMode};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/quests.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DECISION_ROOMS_CONFIG_PATH";
/// Rooms idle longer than this are swept and closed.
const DEFAULT_ROOM_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// How often the background sweeper scans for idle rooms.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Quest catalog keyed by quest id, in configuration order.
    quests: IndexMap<String, Quest>,
    room_idle_timeout: Duration,
    sweep_interval: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in quest catalog.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        count = app_config.quests.len(),
                        "loaded quest catalog from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Every quest currently offered for matchmaking, in catalog order.
    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    /// Look up a quest by identifier.
    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.get(id)
    }

    /// Rooms with no write activity for this long are eligible for closing.
    pub fn room_idle_timeout(&self) -> Duration {
        self.room_idle_timeout
    }

    /// Interval between idle-room sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    #[cfg(test)]
    pub fn with_quests(quests: Vec<Quest>) -> Self {
        Self {
            quests: index_by_id(quests),
            room_idle_timeout: DEFAULT_ROOM_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quests: index_by_id(default_quests()),
            room_idle_timeout: DEFAULT_ROOM_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

fn index_by_id(quests: Vec<Quest>) -> IndexMap<String, Quest> {
    quests
        .into_iter()
        .map(|quest| (quest.id.clone(), quest))
        .collect()
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    quests: Vec<Quest>,
    room_idle_timeout_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let mut quests = Vec::with_capacity(value.quests.len());
        for quest in value.quests {
            match quest.validate() {
                Ok(()) => quests.push(quest),
                Err(err) => warn!(quest_id = %quest.id, error = %err, "skipping invalid quest"),
            }
        }
        if quests.is_empty() {
            warn!("config contained no valid quest; using built-in catalog");
            quests = default_quests();
        }

        Self {
            quests: index_by_id(quests),
            room_idle_timeout: value
                .room_idle_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ROOM_IDLE_TIMEOUT),
            sweep_interval: value
                .sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn option(key: OptionKey, description: &str, impact: &str, tradeoff: &str) -> DecisionOption {
    DecisionOption {
        key,
        description: description.to_owned(),
        impact: impact.to_owned(),
        tradeoff: tradeoff.to_owned(),
    }
}

/// Built-in quest catalog shipped with the binary.
fn default_quests() -> Vec<Quest> {
    vec![
        Quest {
            id: "stranded-expedition".to_owned(),
            title: "The Stranded Expedition".to_owned(),
            mode: QuestMode::Team,
            min_members: 3,
            max_members: 5,
            decisions: vec![
                Decision {
                    title: "The Storm Front".to_owned(),
                    context: "Your survey team is three days from base camp when the \
                              barometer collapses. A storm will hit within hours."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Push on through the pass before the storm lands",
                            "Keeps the schedule intact if you make it",
                            "Exposed terrain with no shelter if you misjudge the timing",
                        ),
                        option(
                            OptionKey::B,
                            "Dig in and ride the storm out where you stand",
                            "Everyone stays together and rested",
                            "Burns two days of supplies with nothing to show",
                        ),
                        option(
                            OptionKey::C,
                            "Split up: two scouts run the pass, the rest shelter",
                            "Hedges both outcomes at once",
                            "Divides your strength when you can least afford it",
                        ),
                    ],
                },
                Decision {
                    title: "The Broken Radio".to_owned(),
                    context: "The storm took the long-range antenna. The spare parts \
                              are in a cache a half-day off your route."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Detour to the cache and restore contact",
                            "Base camp learns you are alive and where",
                            "Costs a half day and the cache may be buried",
                        ),
                        option(
                            OptionKey::B,
                            "Keep moving and stay dark until you arrive",
                            "Fastest path home",
                            "A rescue party may be dispatched for nothing",
                        ),
                        option(
                            OptionKey::C,
                            "Rig a short-range beacon from what you carry",
                            "Partial contact without leaving the route",
                            "Drains batteries you need for navigation",
                        ),
                    ],
                },
                Decision {
                    title: "The Last Ridge".to_owned(),
                    context: "Base camp is visible across the valley. The direct descent \
                              is fast but loose; the long way is safe but ends after dark."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Take the direct descent while there is light",
                            "Home before nightfall",
                            "One bad step on scree ends the expedition differently",
                        ),
                        option(
                            OptionKey::B,
                            "Take the long ridge and walk in by headlamp",
                            "No technical risk at all",
                            "Cold, tired hours in the dark",
                        ),
                        option(
                            OptionKey::C,
                            "Bivouac one more night and descend at dawn",
                            "Fresh legs on the loose ground",
                            "One more night on empty rations",
                        ),
                    ],
                },
            ],
        },
        Quest {
            id: "midnight-launch".to_owned(),
            title: "The Midnight Launch".to_owned(),
            mode: QuestMode::Solo,
            min_members: 1,
            max_members: 2,
            decisions: vec![
                Decision {
                    title: "The Failing Canary".to_owned(),
                    context: "It is six hours to the release window and the canary \
                              deploy is throwing intermittent errors nobody can reproduce."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Ship on schedule and watch the dashboards",
                            "The date holds and the team keeps momentum",
                            "An unexplained error pattern rides into production",
                        ),
                        option(
                            OptionKey::B,
                            "Slip the release a day and chase the flake",
                            "You ship something you understand",
                            "The window was negotiated; the next one is in a month",
                        ),
                        option(
                            OptionKey::C,
                            "Ship behind a kill switch at one percent",
                            "Limits the blast radius while keeping the date",
                            "One percent may never surface the bug at all",
                        ),
                    ],
                },
                Decision {
                    title: "The Partner Integration".to_owned(),
                    context: "A launch partner reports their staging integration broke \
                              under your release candidate an hour ago."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Hold their legacy endpoint alive one more release",
                            "Partner launches with you as planned",
                            "The deprecated path gains another quarter of life",
                        ),
                        option(
                            OptionKey::B,
                            "Hand them a hotfix branch and launch without waiting",
                            "Your timeline stays yours",
                            "The partnership takes the strain",
                        ),
                        option(
                            OptionKey::C,
                            "Pull an engineer off launch duty to pair with them",
                            "Real fix, relationship intact",
                            "Launch night runs one pair of hands short",
                        ),
                    ],
                },
                Decision {
                    title: "The Announcement".to_owned(),
                    context: "Marketing wants the blog post live the moment the deploy \
                              finishes. Rollout telemetry lags by twenty minutes."
                        .to_owned(),
                    options: vec![
                        option(
                            OptionKey::A,
                            "Publish the moment the deploy reports green",
                            "A clean, coordinated splash",
                            "A rollback after the post is a public rollback",
                        ),
                        option(
                            OptionKey::B,
                            "Hold the post until telemetry confirms the rollout",
                            "You never announce a broken launch",
                            "The splash lands twenty quiet minutes late",
                        ),
                        option(
                            OptionKey::C,
                            "Publish a soft note now and the full post tomorrow",
                            "Something ships publicly either way",
                            "Two half-announcements instead of one launch",
                        ),
                    ],
                },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_catalog_passes_validation() {
        for quest in default_quests() {
            quest.validate().expect("default quest must be valid");
        }
    }

    #[test]
    fn quest_lookup_by_id() {
        let config = AppConfig::default();
        assert!(config.quest("stranded-expedition").is_some());
        assert!(config.quest("unknown").is_none());
    }
}
