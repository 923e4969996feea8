use std::fmt::{Debug, Formatter};
use serde::{Deserialize, Serialize};
use crate::{Character, PlayerId};
use crate::pending::Claim;

/// Everything a player can submit. The first field is always the acting player.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Action {
    Income(PlayerId),
    ForeignAid(PlayerId),
    Tax(PlayerId),
    Assassinate(PlayerId, PlayerId),
    Coup(PlayerId, PlayerId),
    Steal(PlayerId, PlayerId),
    Exchange(PlayerId),
    Block(PlayerId, Character),
    Challenge(PlayerId),
    Resolve(PlayerId),
    Lose(PlayerId, usize), // index into the loser's hidden cards
    Keep(PlayerId, Vec<Character>), // cards kept out of an exchange pool
}

impl Action {
    pub fn actor(&self) -> PlayerId {
        match self {
            Action::Income(player_id)
            | Action::ForeignAid(player_id)
            | Action::Tax(player_id)
            | Action::Assassinate(player_id, _)
            | Action::Coup(player_id, _)
            | Action::Steal(player_id, _)
            | Action::Exchange(player_id)
            | Action::Block(player_id, _)
            | Action::Challenge(player_id)
            | Action::Resolve(player_id)
            | Action::Lose(player_id, _)
            | Action::Keep(player_id, _) => *player_id,
        }
    }

    pub fn target(&self) -> Option<PlayerId> {
        match self {
            Action::Assassinate(_, target_id)
            | Action::Coup(_, target_id)
            | Action::Steal(_, target_id) => Some(*target_id),
            _ => None,
        }
    }

    /// The claim this action opens a response window with, if it is a claimed turn action.
    pub fn claim(&self) -> Option<Claim> {
        match self {
            Action::ForeignAid(_) => Some(Claim::ForeignAid),
            Action::Tax(_) => Some(Claim::Tax),
            Action::Assassinate(_, target_id) => Some(Claim::Assassinate(*target_id)),
            Action::Steal(_, target_id) => Some(Claim::Steal(*target_id)),
            Action::Exchange(_) => Some(Claim::Exchange),
            _ => None,
        }
    }

    /// Actions taken on one's own turn, as opposed to responses and choices.
    pub fn is_turn_action(&self) -> bool {
        matches!(self, Action::Income(_) | Action::Coup(_, _)) || self.claim().is_some()
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Action::Block(_, _) | Action::Challenge(_) | Action::Resolve(_))
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Income(player_id) => {
                f.write_fmt(format_args!("Player {player_id} takes Income"))
            }
            Action::ForeignAid(player_id) => {
                f.write_fmt(format_args!("Player {player_id} gets foreign aid"))
            }
            Action::Tax(player_id) => {
                f.write_fmt(format_args!("Player {player_id} gets Taxes"))
            }
            Action::Assassinate(player_id, target_id) => {
                f.write_fmt(format_args!("Player {player_id} assassinates {target_id}"))
            }
            Action::Coup(player_id, target_id) => {
                f.write_fmt(format_args!("Player {player_id} coups {target_id}"))
            }
            Action::Steal(player_id, target_id) => {
                f.write_fmt(format_args!("Player {player_id} steals from {target_id}"))
            }
            Action::Exchange(player_id) => {
                f.write_fmt(format_args!("Player {player_id} exchanges with the deck"))
            }
            Action::Block(player_id, character) => {
                f.write_fmt(format_args!("Player {player_id} blocks with {:?}", character))
            }
            Action::Challenge(player_id) => {
                f.write_fmt(format_args!("Player {player_id} challenges"))
            }
            Action::Resolve(player_id) => {
                f.write_fmt(format_args!("Player {player_id} lets the claim stand"))
            }
            Action::Lose(player_id, card_idx) => {
                f.write_fmt(format_args!("Player {player_id} loses card {card_idx}"))
            }
            Action::Keep(player_id, cards) => {
                f.write_fmt(format_args!("Player {player_id} keeps {:?}", cards))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::PlayerId;
    use crate::pending::Claim;
    use super::Action;

    #[test]
    fn classification() {
        let p0 = PlayerId(0);
        let p1 = PlayerId(1);

        assert!(Action::Income(p0).is_turn_action());
        assert!(Action::Coup(p0, p1).is_turn_action());
        assert_eq!(Action::Coup(p0, p1).claim(), None);
        assert_eq!(Action::Steal(p0, p1).claim(), Some(Claim::Steal(p1)));
        assert!(Action::Resolve(p1).is_response());
        assert!(!Action::Lose(p1, 0).is_turn_action());
        assert_eq!(Action::Keep(p1, vec![]).actor(), p1);
    }

    #[test]
    fn serializes_as_tagged_json() {
        let json = serde_json::to_string(&Action::Steal(PlayerId(3), PlayerId(4))).unwrap();
        assert_eq!(json, r#"{"Steal":[3,4]}"#);

        let action: Action = serde_json::from_str(r#"{"Block":[2,"Contessa"]}"#).unwrap();
        assert_eq!(action, Action::Block(PlayerId(2), crate::Character::Contessa));
    }
}
