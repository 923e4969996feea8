use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::Character;

/// Opaque identity handed over by the room roster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// One entry of the roster a game is started from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
}

impl Seat {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id: PlayerId(id), name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) balance: u32,
    pub(crate) hidden: Vec<Character>,
    pub(crate) revealed: Vec<Character>,
    pub(crate) alive: bool,
}

impl Player {
    pub(crate) fn new(seat: &Seat, balance: u32, hidden: Vec<Character>) -> Self {
        Self {
            id: seat.id,
            name: seat.name.clone(),
            balance,
            alive: !hidden.is_empty(),
            hidden,
            revealed: vec![],
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn hidden(&self) -> &[Character] {
        &self.hidden
    }

    pub fn revealed(&self) -> &[Character] {
        &self.revealed
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn holds(&self, character: Character) -> Option<usize> {
        self.hidden.iter().position(|&c| c == character)
    }

    /// Flips a hidden card face up. Returns true if that was the player's last influence.
    pub(crate) fn reveal(&mut self, card_idx: usize) -> bool {
        let card = self.hidden.remove(card_idx);
        self.revealed.push(card);

        if self.hidden.is_empty() {
            self.alive = false;
        }

        !self.alive
    }
}

#[cfg(test)]
mod tests {
    use crate::Character::{Captain, Duke};
    use super::{Player, Seat};

    #[test]
    fn revealing_the_last_card_kills() {
        let mut player = Player::new(&Seat::new(1, "ada"), 2, vec![Duke, Captain]);
        assert!(player.is_alive());

        assert!(!player.reveal(1));
        assert_eq!(player.revealed(), &[Captain]);
        assert!(player.is_alive());

        assert!(player.reveal(0));
        assert!(player.hidden().is_empty());
        assert!(!player.is_alive());
    }

    #[test]
    fn holds_finds_hidden_cards_only() {
        let mut player = Player::new(&Seat::new(1, "ada"), 2, vec![Duke, Captain]);
        assert_eq!(player.holds(Captain), Some(1));

        player.reveal(1);
        assert_eq!(player.holds(Captain), None);
    }
}
