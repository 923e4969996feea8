use thiserror::Error;
use crate::PlayerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoupError {
    #[error("invalid action: {0}")]
    InvalidAction(Rejection),
    #[error("player {0} is not seated in this game")]
    UnknownPlayer(PlayerId),
    #[error("player {0} can't be targeted")]
    IllegalTarget(PlayerId),
    #[error("deck exhausted (wanted {wanted}, {remaining} remaining)")]
    DeckExhausted { wanted: usize, remaining: usize },
    #[error("game is over, player {winner} already won")]
    TerminalState { winner: PlayerId },
    #[error("a game needs 2 to 6 players, got {0}")]
    InvalidPlayerCount(usize),
    #[error("player {0} is seated twice")]
    DuplicatePlayer(PlayerId),
}

/// Why an otherwise well-formed action was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("player has been eliminated")]
    Eliminated,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("a claim is waiting for responses")]
    ResponseWindowOpen,
    #[error("waiting on a choice from player {0}")]
    AwaitingChoice(PlayerId),
    #[error("balance of 10 or more forces a coup")]
    ForcedCoup,
    #[error("needs {needed} coins, has {balance}")]
    InsufficientBalance { needed: u32, balance: u32 },
    #[error("there is no claim to respond to")]
    NothingPending,
    #[error("the claim has already been blocked")]
    AlreadyBlocked,
    #[error("this action can't be blocked")]
    NotBlockable,
    #[error("that character doesn't block this action")]
    BadBlockClaim,
    #[error("this claim can't be challenged")]
    NotChallengeable,
    #[error("players can't respond to their own claim")]
    OwnClaim,
    #[error("player already passed on this claim")]
    AlreadyResponded,
    #[error("no hidden card at index {0}")]
    NoSuchCard(usize),
    #[error("kept cards must be {keep} cards from the offered pool")]
    BadExchangeSelection { keep: usize },
}

impl From<Rejection> for CoupError {
    fn from(rejection: Rejection) -> Self {
        CoupError::InvalidAction(rejection)
    }
}
