use serde::{Deserialize, Serialize};
use crate::{Character, Coup, PendingAction, Phase, PlayerId};

/// One player's public record, with hidden cards only when the viewer owns them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub balance: u32,
    pub influence: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Vec<Character>>,
    pub revealed: Vec<Character>,
    pub alive: bool,
}

/// The game as one seat is allowed to see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub viewer: PlayerId,
    pub turn: usize,
    pub current_player: PlayerId,
    pub phase: Phase,
    pub deck_size: usize,
    pub players: Vec<PlayerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

impl Coup {
    pub fn view(&self, viewer: PlayerId) -> GameView {
        let players = self.players()
            .iter()
            .map(|player| PlayerView {
                id: player.id(),
                name: player.name().to_string(),
                balance: player.balance(),
                influence: player.hidden().len(),
                hidden: (player.id() == viewer).then(|| player.hidden().to_vec()),
                revealed: player.revealed().to_vec(),
                alive: player.is_alive(),
            })
            .collect();

        GameView {
            viewer,
            turn: self.turn(),
            current_player: self.current_player().id(),
            phase: self.phase(),
            deck_size: self.deck().len(),
            players,
            pending: self.pending().cloned(),
            winner: self.winner(),
        }
    }
}
