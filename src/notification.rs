use serde::{Deserialize, Serialize};
use crate::{Character, PlayerId};

/// Out-of-band events raised while applying an action.
///
/// Choice prompts are addressed to one player, who has to answer before the game can move on.
/// Everything else is public.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ChooseInfluenceToLose {
        player: PlayerId,
        hidden: Vec<Character>,
    },
    ChooseExchange {
        player: PlayerId,
        pool: Vec<Character>,
        keep: usize,
    },
    ChallengeResolved {
        challenger: PlayerId,
        accused: PlayerId,
        character: Character,
        truthful: bool,
    },
    InfluenceLost {
        player: PlayerId,
        character: Character,
    },
    PlayerEliminated {
        player: PlayerId,
    },
    GameOver {
        winner: PlayerId,
    },
}

impl Notification {
    /// The only player who should see this, when it carries private cards.
    pub fn recipient(&self) -> Option<PlayerId> {
        match self {
            Notification::ChooseInfluenceToLose { player, .. }
            | Notification::ChooseExchange { player, .. } => Some(*player),
            _ => None,
        }
    }
}
