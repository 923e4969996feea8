use std::time::Duration;
use serde::{Deserialize, Serialize};

/// How a player gives up influence after a lost challenge, a coup or an assassination.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceLoss {
    /// The player picks which hidden card to reveal.
    #[default]
    PlayerChoice,
    /// The most recently dealt hidden card is revealed without asking.
    Automatic,
}

impl InfluenceLoss {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "choice" | "player_choice" => Some(InfluenceLoss::PlayerChoice),
            "auto" | "automatic" => Some(InfluenceLoss::Automatic),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub influence_loss: InfluenceLoss,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubConfig {
    pub rules: RulesConfig,
    /// Rooms with no accepted action for this long are reclaimed by the sweep.
    pub idle_timeout: Duration,
    /// Seeds every room's shuffle when set, for reproducible games.
    pub seed: Option<u64>,
    pub demo_players: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            idle_timeout: Duration::from_millis(600_000),
            seed: None,
            demo_players: 4,
        }
    }
}

impl HubConfig {
    pub fn from_env() -> Self {
        let fallback = Self::default();

        Self {
            rules: RulesConfig {
                influence_loss: std::env::var("COUP_INFLUENCE_LOSS")
                    .ok()
                    .and_then(|raw| InfluenceLoss::parse(&raw))
                    .unwrap_or(fallback.rules.influence_loss),
            },
            idle_timeout: Duration::from_millis(read_u64("COUP_IDLE_TIMEOUT_MS", fallback.idle_timeout.as_millis() as u64)),
            seed: std::env::var("COUP_SEED").ok().and_then(|raw| raw.parse::<u64>().ok()),
            demo_players: read_usize("COUP_DEMO_PLAYERS", fallback.demo_players),
        }
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_usize(key: &str, fallback: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::InfluenceLoss;

    #[test]
    fn parses_influence_loss() {
        assert_eq!(InfluenceLoss::parse("Automatic"), Some(InfluenceLoss::Automatic));
        assert_eq!(InfluenceLoss::parse(" choice "), Some(InfluenceLoss::PlayerChoice));
        assert_eq!(InfluenceLoss::parse("coin flip"), None);
        assert_eq!(InfluenceLoss::default(), InfluenceLoss::PlayerChoice);
    }
}
