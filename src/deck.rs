use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;
use crate::error::CoupError;
use crate::{Character, CHARACTER_VARIANTS};

/// Copies of each character printed in a full deck.
pub const COPIES_PER_CHARACTER: usize = 3;

/// Size of the full deck, every card that is ever in play.
pub const DECK_SIZE: usize = CHARACTER_VARIANTS.len() * COPIES_PER_CHARACTER;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Character>,
}

impl Deck {
    /// The full, unshuffled deck.
    pub fn full() -> Self {
        let cards = CHARACTER_VARIANTS.iter()
            .flat_map(|&card| std::iter::repeat(card).take(COPIES_PER_CHARACTER))
            .collect();

        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Character] {
        &self.cards
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes the top `n` cards.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Character>, CoupError> {
        if n > self.cards.len() {
            return Err(CoupError::DeckExhausted { wanted: n, remaining: self.cards.len() });
        }

        trace!(n, remaining = self.cards.len() - n, "drawing from deck");
        Ok(self.cards.drain(..n).collect())
    }

    /// Pulls one specific card out of the deck.
    pub(crate) fn take(&mut self, character: Character) -> Option<Character> {
        let idx = self.cards.iter().position(|&c| c == character)?;
        Some(self.cards.remove(idx))
    }

    /// Returns cards to the deck and reshuffles so nobody can track where they went.
    pub fn put_back<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = Character>, rng: &mut R) {
        self.cards.extend(cards);
        self.cards.shuffle(rng);
    }
}
