use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use serde::{Deserialize, Serialize};
use crate::{Character, PlayerId};
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};

/// A turn action that rests on a claim and so opens a response window.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Claim {
    ForeignAid,
    Tax,
    Assassinate(PlayerId),
    Steal(PlayerId),
    Exchange,
}

impl Claim {
    /// The character the claimant says they hold. Foreign aid claims nothing.
    pub fn required_character(&self) -> Option<Character> {
        match self {
            Claim::ForeignAid => None,
            Claim::Tax => Some(Duke),
            Claim::Assassinate(_) => Some(Assassin),
            Claim::Steal(_) => Some(Captain),
            Claim::Exchange => Some(Ambassador),
        }
    }

    /// Characters that may be claimed to block this action.
    pub fn blockers(&self) -> &'static [Character] {
        match self {
            Claim::ForeignAid => &[Duke],
            Claim::Assassinate(_) => &[Contessa],
            Claim::Steal(_) => &[Captain, Ambassador],
            Claim::Tax | Claim::Exchange => &[],
        }
    }

    pub fn target(&self) -> Option<PlayerId> {
        match self {
            Claim::Assassinate(target) | Claim::Steal(target) => Some(*target),
            _ => None,
        }
    }
}

impl Debug for Claim {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Claim::ForeignAid => f.write_str("foreign aid"),
            Claim::Tax => f.write_str("tax"),
            Claim::Assassinate(target) => f.write_fmt(format_args!("assassinate {target}")),
            Claim::Steal(target) => f.write_fmt(format_args!("steal from {target}")),
            Claim::Exchange => f.write_str("exchange"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub blocker: PlayerId,
    pub claim: Character,
}

/// An in-flight claim waiting on the other players to block, challenge or pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub(crate) claim: Claim,
    pub(crate) initiator: PlayerId,
    pub(crate) block: Option<Block>,
    // players who passed on the live claim
    pub(crate) responded: BTreeSet<PlayerId>,
    // the initiator already survived a challenge
    pub(crate) challenged: bool,
}

impl PendingAction {
    pub(crate) fn new(initiator: PlayerId, claim: Claim) -> Self {
        Self {
            claim,
            initiator,
            block: None,
            responded: BTreeSet::new(),
            challenged: false,
        }
    }

    pub fn claim(&self) -> Claim {
        self.claim
    }

    pub fn initiator(&self) -> PlayerId {
        self.initiator
    }

    pub fn target(&self) -> Option<PlayerId> {
        self.claim.target()
    }

    pub fn block(&self) -> Option<Block> {
        self.block
    }

    pub fn responded(&self) -> &BTreeSet<PlayerId> {
        &self.responded
    }

    /// Whoever currently holds the claim being responded to: the blocker once there is one.
    pub fn claimant(&self) -> PlayerId {
        match self.block {
            Some(block) => block.blocker,
            None => self.initiator,
        }
    }

    /// The character the live claim rests on.
    pub fn claimed_character(&self) -> Option<Character> {
        match self.block {
            Some(block) => Some(block.claim),
            None => self.claim.required_character(),
        }
    }

    pub fn is_challengeable(&self) -> bool {
        match self.block {
            Some(_) => true,
            None => !self.challenged && self.claim.required_character().is_some(),
        }
    }

    pub(crate) fn attach_block(&mut self, block: Block) {
        self.block = Some(block);
        self.responded.clear();
    }

    pub(crate) fn strip_block(&mut self) {
        self.block = None;
        self.responded.clear();
    }

    /// True once every living player besides the claimant has passed.
    pub(crate) fn is_settled(&self, mut living: impl Iterator<Item = PlayerId>) -> bool {
        let claimant = self.claimant();
        living.all(|player| player == claimant || self.responded.contains(&player))
    }
}

#[cfg(test)]
mod tests {
    use crate::PlayerId;
    use crate::Character::{Captain, Contessa, Duke};
    use super::{Block, Claim, PendingAction};

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    #[test]
    fn claims_map_to_characters() {
        assert_eq!(Claim::Tax.required_character(), Some(Duke));
        assert_eq!(Claim::ForeignAid.required_character(), None);
        assert_eq!(Claim::ForeignAid.blockers(), &[Duke]);
        assert_eq!(Claim::Assassinate(P1).blockers(), &[Contessa]);
        assert!(Claim::Tax.blockers().is_empty());
        assert_eq!(Claim::Steal(P2).target(), Some(P2));
    }

    #[test]
    fn block_moves_the_live_claim() {
        let mut pending = PendingAction::new(P0, Claim::Steal(P1));
        pending.responded.insert(P2);
        assert_eq!(pending.claimant(), P0);

        pending.attach_block(Block { blocker: P2, claim: Captain });
        assert_eq!(pending.claimant(), P2);
        assert_eq!(pending.claimed_character(), Some(Captain));
        assert!(pending.responded.is_empty());

        pending.strip_block();
        assert_eq!(pending.claimant(), P0);
    }

    #[test]
    fn settled_once_everyone_else_passed() {
        let mut pending = PendingAction::new(P0, Claim::Tax);
        let living = [P0, P1, P2];
        assert!(!pending.is_settled(living.into_iter()));

        pending.responded.insert(P1);
        assert!(!pending.is_settled(living.into_iter()));

        pending.responded.insert(P2);
        assert!(pending.is_settled(living.into_iter()));
    }

    #[test]
    fn foreign_aid_claims_no_character() {
        let mut pending = PendingAction::new(P0, Claim::ForeignAid);
        assert!(!pending.is_challengeable());

        pending.attach_block(Block { blocker: P1, claim: Duke });
        assert!(pending.is_challengeable());
    }
}
