pub mod action;
pub mod config;
pub mod deck;
pub mod error;
pub mod notification;
pub mod pending;
pub mod player;
pub mod session;
pub mod view;

pub use action::Action;
pub use config::{HubConfig, InfluenceLoss, RulesConfig};
pub use deck::{Deck, DECK_SIZE};
pub use error::{CoupError, Rejection};
pub use notification::Notification;
pub use pending::{Block, Claim, PendingAction};
pub use player::{Player, PlayerId, Seat};
pub use session::{Envelope, Hub, HubError, HubEvent, Recipient, RoomId};
pub use view::{GameView, PlayerView};

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Character {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
}

pub const CHARACTER_VARIANTS: [Character; 5] = [
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
];

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const STARTING_BALANCE: u32 = 2;
pub const STARTING_HAND: usize = 2;
pub const COUP_COST: u32 = 7;
pub const ASSASSINATE_COST: u32 = 3;
pub const FORCED_COUP_BALANCE: u32 = 10;
pub const EXCHANGE_DRAW: usize = 2;

/// What happens once a player has given up an influence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfterLoss {
    /// Drop whatever is pending and hand the turn on.
    EndTurn,
    /// The claim survives, keep collecting responses.
    ResumeWindow,
}

/// A choice one player owes before anything else can happen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interrupt {
    LoseInfluence { player: PlayerId, then: AfterLoss },
    // the pool is the player's hidden cards, drawn cards included
    Exchange { player: PlayerId, keep: usize },
}

impl Interrupt {
    pub fn player(&self) -> PlayerId {
        match self {
            Interrupt::LoseInfluence { player, .. } | Interrupt::Exchange { player, .. } => *player,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingAction,
    AwaitingResponse,
    AwaitingInfluenceLoss(PlayerId),
    AwaitingExchange(PlayerId),
    GameOver(PlayerId),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coup {
    turn: usize,
    current_player_idx: usize,
    deck: Deck,
    players: Vec<Player>,
    rules: RulesConfig,

    pending: Option<PendingAction>,
    interrupt: Option<Interrupt>,
    winner: Option<PlayerId>,

    #[serde(skip)]
    notifications: Vec<Notification>,
}

impl Debug for Coup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("T {} | P {} | {:?}\n", self.turn, self.current_player().id, self.phase()).as_str())?;
        for player in &self.players {
            f.write_str(format!("\t{}: ${} | {:?} {:?}\n", player.id, player.balance, player.hidden, player.revealed).as_str())?;
        }
        Ok(())
    }
}

impl Coup {
    pub fn new<R: Rng + ?Sized>(roster: &[Seat], rules: RulesConfig, rng: &mut R) -> Result<Self, CoupError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&roster.len()) {
            return Err(CoupError::InvalidPlayerCount(roster.len()));
        }

        let mut seen = HashSet::with_capacity(roster.len());
        if let Some(seat) = roster.iter().find(|seat| !seen.insert(seat.id)) {
            return Err(CoupError::DuplicatePlayer(seat.id));
        }

        let mut deck = Deck::full();
        deck.shuffle(rng);

        let players = roster.iter()
            .map(|seat| Ok(Player::new(seat, STARTING_BALANCE, deck.draw(STARTING_HAND)?)))
            .collect::<Result<Vec<Player>, CoupError>>()?;

        info!(players = players.len(), "dealt a new game");

        Ok(Self {
            turn: 0,
            current_player_idx: 0,
            deck,
            players,
            rules,
            pending: None,
            interrupt: None,
            winner: None,
            notifications: vec![],
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_idx]
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn rules(&self) -> RulesConfig {
        self.rules
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn interrupt(&self) -> Option<&Interrupt> {
        self.interrupt.as_ref()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Events raised by the action that produced this state.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn phase(&self) -> Phase {
        if let Some(winner) = self.winner {
            return Phase::GameOver(winner);
        }

        match &self.interrupt {
            Some(Interrupt::LoseInfluence { player, .. }) => Phase::AwaitingInfluenceLoss(*player),
            Some(Interrupt::Exchange { player, .. }) => Phase::AwaitingExchange(*player),
            None if self.pending.is_some() => Phase::AwaitingResponse,
            None => Phase::AwaitingAction,
        }
    }

    fn idx(&self, player_id: PlayerId) -> Result<usize, CoupError> {
        self.players
            .iter()
            .position(|player| player.id == player_id)
            .ok_or(CoupError::UnknownPlayer(player_id))
    }

    fn living_ids(&self) -> impl Iterator<Item=PlayerId> + '_ {
        self.players.iter().filter(|player| player.alive).map(|player| player.id)
    }

    fn other_living_ids(&self, exclude: PlayerId) -> Vec<PlayerId> {
        let n = self.players.len();
        let start = self.idx(exclude).unwrap_or(0);

        (1..n)
            .map(|offset| &self.players[(start + offset) % n])
            .filter(|player| player.alive && player.id != exclude)
            .map(|player| player.id)
            .collect()
    }

    pub fn validate_action(&self, action: &Action) -> bool {
        self.check(action).is_ok()
    }

    /// Explains why `action` can't be applied right now.
    pub fn check(&self, action: &Action) -> Result<(), CoupError> {
        if let Some(winner) = self.winner {
            return Err(CoupError::TerminalState { winner });
        }

        let actor_id = action.actor();
        let actor = &self.players[self.idx(actor_id)?];
        if !actor.alive {
            return Err(Rejection::Eliminated.into());
        }

        if let Some(interrupt) = &self.interrupt {
            return Self::check_choice(interrupt, actor, action);
        }

        if let Some(pending) = &self.pending {
            return match action {
                Action::Block(_, character) => Self::check_block(pending, actor_id, *character),
                Action::Challenge(_) => {
                    Self::check_responder(pending, actor_id)?;
                    if pending.is_challengeable() {
                        Ok(())
                    } else {
                        Err(Rejection::NotChallengeable.into())
                    }
                }
                Action::Resolve(_) => Self::check_responder(pending, actor_id),
                _ => Err(Rejection::ResponseWindowOpen.into()),
            };
        }

        if !action.is_turn_action() {
            return Err(Rejection::NothingPending.into());
        }

        if self.current_player().id != actor_id {
            return Err(Rejection::NotYourTurn.into());
        }

        if actor.balance >= FORCED_COUP_BALANCE && !matches!(action, Action::Coup(_, _)) {
            return Err(Rejection::ForcedCoup.into());
        }

        match action {
            Action::Income(_) | Action::ForeignAid(_) | Action::Tax(_) | Action::Exchange(_) => Ok(()),
            Action::Coup(_, target_id) => {
                Self::check_balance(actor, COUP_COST)?;
                self.check_target(actor_id, *target_id)
            }
            Action::Assassinate(_, target_id) => {
                Self::check_balance(actor, ASSASSINATE_COST)?;
                self.check_target(actor_id, *target_id)
            }
            Action::Steal(_, target_id) => self.check_target(actor_id, *target_id),
            Action::Block(_, _)
            | Action::Challenge(_)
            | Action::Resolve(_)
            | Action::Lose(_, _)
            | Action::Keep(_, _) => Err(Rejection::NothingPending.into()),
        }
    }

    fn check_choice(interrupt: &Interrupt, actor: &Player, action: &Action) -> Result<(), CoupError> {
        match (interrupt, action) {
            (Interrupt::LoseInfluence { player, .. }, Action::Lose(_, card_idx)) if *player == actor.id => {
                if *card_idx < actor.hidden.len() {
                    Ok(())
                } else {
                    Err(Rejection::NoSuchCard(*card_idx).into())
                }
            }
            (Interrupt::Exchange { player, keep }, Action::Keep(_, cards)) if *player == actor.id => {
                if cards.len() == *keep && is_sub_multiset(cards, &actor.hidden) {
                    Ok(())
                } else {
                    Err(Rejection::BadExchangeSelection { keep: *keep }.into())
                }
            }
            _ => Err(Rejection::AwaitingChoice(interrupt.player()).into()),
        }
    }

    fn check_responder(pending: &PendingAction, responder: PlayerId) -> Result<(), CoupError> {
        if pending.claimant() == responder {
            return Err(Rejection::OwnClaim.into());
        }

        if pending.responded.contains(&responder) {
            return Err(Rejection::AlreadyResponded.into());
        }

        Ok(())
    }

    fn check_block(pending: &PendingAction, blocker: PlayerId, character: Character) -> Result<(), CoupError> {
        if pending.block.is_some() {
            return Err(Rejection::AlreadyBlocked.into());
        }

        Self::check_responder(pending, blocker)?;

        let blockers = pending.claim.blockers();
        if blockers.is_empty() {
            Err(Rejection::NotBlockable.into())
        } else if !blockers.contains(&character) {
            Err(Rejection::BadBlockClaim.into())
        } else {
            Ok(())
        }
    }

    fn check_balance(actor: &Player, needed: u32) -> Result<(), CoupError> {
        if actor.balance < needed {
            return Err(Rejection::InsufficientBalance { needed, balance: actor.balance }.into());
        }
        Ok(())
    }

    fn check_target(&self, actor_id: PlayerId, target_id: PlayerId) -> Result<(), CoupError> {
        match self.player(target_id) {
            Some(target) if target.alive && target.id != actor_id => Ok(()),
            _ => Err(CoupError::IllegalTarget(target_id)),
        }
    }

    /// Every action that would currently validate, for every player.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.players.len() * 2);

        if self.winner.is_some() {
            return actions;
        }

        match (&self.interrupt, &self.pending) {
            (Some(Interrupt::LoseInfluence { player, .. }), _) => {
                if let Some(loser) = self.player(*player) {
                    for card_idx in 0..loser.hidden.len() {
                        actions.push(Action::Lose(*player, card_idx));
                    }
                }
            }
            (Some(Interrupt::Exchange { player, keep }), _) => {
                if let Some(exchanger) = self.player(*player) {
                    for cards in keep_choices(&exchanger.hidden, *keep) {
                        actions.push(Action::Keep(*player, cards));
                    }
                }
            }
            (None, Some(pending)) => {
                for responder in self.other_living_ids(pending.claimant()) {
                    if pending.responded.contains(&responder) {
                        continue;
                    }

                    actions.push(Action::Resolve(responder));

                    if pending.is_challengeable() {
                        actions.push(Action::Challenge(responder));
                    }

                    if pending.block.is_none() && responder != pending.initiator {
                        for &character in pending.claim.blockers() {
                            actions.push(Action::Block(responder, character));
                        }
                    }
                }
            }
            (None, None) => {
                let player = self.current_player();
                let opponents = self.other_living_ids(player.id);

                if player.balance >= FORCED_COUP_BALANCE {
                    // forced coup at $10+
                    for opponent_id in opponents {
                        actions.push(Action::Coup(player.id, opponent_id));
                    }
                } else {
                    actions.push(Action::Income(player.id));
                    actions.push(Action::ForeignAid(player.id));
                    actions.push(Action::Tax(player.id));
                    actions.push(Action::Exchange(player.id));

                    for opponent_id in opponents {
                        if player.balance >= COUP_COST {
                            actions.push(Action::Coup(player.id, opponent_id));
                        }
                        if player.balance >= ASSASSINATE_COST {
                            actions.push(Action::Assassinate(player.id, opponent_id));
                        }
                        actions.push(Action::Steal(player.id, opponent_id));
                    }
                }
            }
        }

        actions
    }

    /// Applies a validated action to a copy of the game. On error this game is left as it was.
    pub fn apply_action<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> Result<Coup, CoupError> {
        self.check(&action)?;

        debug!(turn = self.turn, ?action, "applying action");

        let mut game = self.clone();
        game.notifications.clear();

        match &action {
            Action::Income(player_id) => {
                let idx = game.idx(*player_id)?;
                game.players[idx].balance += 1;
                game.go_next_turn();
            }
            Action::Coup(player_id, target_id) => {
                let idx = game.idx(*player_id)?;
                game.players[idx].balance -= COUP_COST;
                game.lose_influence(*target_id, AfterLoss::EndTurn)?;
            }
            Action::ForeignAid(player_id)
            | Action::Tax(player_id)
            | Action::Assassinate(player_id, _)
            | Action::Steal(player_id, _)
            | Action::Exchange(player_id) => {
                let Some(claim) = action.claim() else {
                    return Err(Rejection::NothingPending.into());
                };

                // assassins are paid up front, even if the attempt is blocked
                if let Claim::Assassinate(_) = claim {
                    let idx = game.idx(*player_id)?;
                    game.players[idx].balance -= ASSASSINATE_COST;
                }

                game.pending = Some(PendingAction::new(*player_id, claim));
            }
            Action::Block(player_id, character) => {
                if let Some(pending) = game.pending.as_mut() {
                    pending.attach_block(Block { blocker: *player_id, claim: *character });
                }
            }
            Action::Challenge(player_id) => {
                game.resolve_challenge(*player_id, rng)?;
            }
            Action::Resolve(player_id) => {
                if let Some(pending) = game.pending.as_mut() {
                    pending.responded.insert(*player_id);
                }
                game.settle_window()?;
            }
            Action::Lose(player_id, card_idx) => {
                let then = match game.interrupt.take() {
                    Some(Interrupt::LoseInfluence { then, .. }) => then,
                    _ => return Err(Rejection::NothingPending.into()),
                };

                let idx = game.idx(*player_id)?;
                game.reveal_influence(idx, *card_idx);
                if game.winner.is_none() {
                    game.after_loss(then)?;
                }
            }
            Action::Keep(player_id, cards) => {
                game.interrupt = None;

                let idx = game.idx(*player_id)?;
                let mut returned = std::mem::replace(&mut game.players[idx].hidden, cards.clone());
                for card in cards {
                    if let Some(pos) = returned.iter().position(|c| c == card) {
                        returned.remove(pos);
                    }
                }

                game.deck.put_back(returned, rng);
                game.go_next_turn();
            }
        }

        Ok(game)
    }

    fn resolve_challenge<R: Rng + ?Sized>(&mut self, challenger: PlayerId, rng: &mut R) -> Result<(), CoupError> {
        let Some(pending) = self.pending.as_ref() else {
            return Err(Rejection::NothingPending.into());
        };
        let Some(character) = pending.claimed_character() else {
            return Err(Rejection::NotChallengeable.into());
        };
        let accused = pending.claimant();
        let blocked = pending.block.is_some();

        let accused_idx = self.idx(accused)?;
        let proof = self.players[accused_idx].holds(character);

        debug!(%challenger, %accused, ?character, truthful = proof.is_some(), "challenge resolved");
        self.notifications.push(Notification::ChallengeResolved {
            challenger,
            accused,
            character,
            truthful: proof.is_some(),
        });

        match proof {
            Some(card_idx) => {
                // the shown card goes back into the deck so nobody knows what replaced it
                self.replace_influence_card(accused_idx, card_idx, rng)?;

                if blocked {
                    // block stands, the action is cancelled
                    self.lose_influence(challenger, AfterLoss::EndTurn)
                } else {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.challenged = true;
                        pending.responded.insert(challenger);
                    }
                    self.lose_influence(challenger, AfterLoss::ResumeWindow)
                }
            }
            None => {
                if blocked {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.strip_block();
                    }
                    self.lose_influence(accused, AfterLoss::ResumeWindow)
                } else {
                    self.pending = None;
                    self.lose_influence(accused, AfterLoss::EndTurn)
                }
            }
        }
    }

    /// Applies or cancels the pending claim once everyone who may respond has passed.
    fn settle_window(&mut self) -> Result<(), CoupError> {
        let settled = match &self.pending {
            Some(pending) => pending.is_settled(self.living_ids()),
            None => false,
        };

        if !settled {
            return Ok(());
        }

        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        match pending.block {
            Some(block) => {
                debug!(blocker = %block.blocker, claim = ?pending.claim, "block stands");
                self.go_next_turn();
                Ok(())
            }
            None => self.apply_claim(pending.initiator, pending.claim),
        }
    }

    fn apply_claim(&mut self, initiator: PlayerId, claim: Claim) -> Result<(), CoupError> {
        let idx = self.idx(initiator)?;

        match claim {
            Claim::ForeignAid => {
                self.players[idx].balance += 2;
                self.go_next_turn();
            }
            Claim::Tax => {
                self.players[idx].balance += 3;
                self.go_next_turn();
            }
            Claim::Assassinate(target_id) => {
                // target could already be dead from losing a challenge
                self.lose_influence(target_id, AfterLoss::EndTurn)?;
            }
            Claim::Steal(target_id) => {
                let target_idx = self.idx(target_id)?;
                let n = self.players[target_idx].balance.min(2);
                self.players[target_idx].balance -= n;
                self.players[idx].balance += n;
                self.go_next_turn();
            }
            Claim::Exchange => {
                let keep = self.players[idx].hidden.len();
                let drawn = self.deck.draw(EXCHANGE_DRAW)?;
                self.players[idx].hidden.extend(drawn);

                self.interrupt = Some(Interrupt::Exchange { player: initiator, keep });
                self.notifications.push(Notification::ChooseExchange {
                    player: initiator,
                    pool: self.players[idx].hidden.clone(),
                    keep,
                });
            }
        }

        Ok(())
    }

    /// Takes one influence from a player, asking them which one when there is a choice to make.
    fn lose_influence(&mut self, player_id: PlayerId, then: AfterLoss) -> Result<(), CoupError> {
        let idx = self.idx(player_id)?;
        let remaining = self.players[idx].hidden.len();

        if remaining == 0 {
            return self.after_loss(then);
        }

        if remaining == 1 || self.rules.influence_loss == InfluenceLoss::Automatic {
            self.reveal_influence(idx, remaining - 1);
            if self.winner.is_none() {
                self.after_loss(then)?;
            }
        } else {
            self.notifications.push(Notification::ChooseInfluenceToLose {
                player: player_id,
                hidden: self.players[idx].hidden.clone(),
            });
            self.interrupt = Some(Interrupt::LoseInfluence { player: player_id, then });
        }

        Ok(())
    }

    fn after_loss(&mut self, then: AfterLoss) -> Result<(), CoupError> {
        match then {
            AfterLoss::EndTurn => {
                self.go_next_turn();
                Ok(())
            }
            AfterLoss::ResumeWindow => self.settle_window(),
        }
    }

    fn reveal_influence(&mut self, idx: usize, card_idx: usize) {
        let player = &mut self.players[idx];
        let character = player.hidden[card_idx];
        let eliminated = player.reveal(card_idx);
        let player_id = player.id;

        self.notifications.push(Notification::InfluenceLost { player: player_id, character });

        if eliminated {
            info!(player = %player_id, "player eliminated");
            self.notifications.push(Notification::PlayerEliminated { player: player_id });
            self.check_winner();
        }
    }

    fn check_winner(&mut self) {
        let survivor = {
            let mut living = self.living_ids();
            match (living.next(), living.next()) {
                (Some(winner), None) => Some(winner),
                _ => None,
            }
        };

        if let Some(winner) = survivor {
            info!(%winner, turn = self.turn, "game over");
            self.winner = Some(winner);
            self.pending = None;
            self.interrupt = None;
            self.notifications.push(Notification::GameOver { winner });
        }
    }

    fn replace_influence_card<R: Rng + ?Sized>(&mut self, idx: usize, card_idx: usize, rng: &mut R) -> Result<(), CoupError> {
        let card = self.players[idx].hidden.remove(card_idx);
        self.deck.put_back([card], rng);

        // put the card back at the right position
        let mut drawn = self.deck.draw(1)?;
        if let Some(card) = drawn.pop() {
            self.players[idx].hidden.insert(card_idx, card);
        }

        Ok(())
    }

    fn go_next_turn(&mut self) {
        // reset state
        self.pending = None;
        self.interrupt = None;

        // player's turn is over
        self.turn += 1;

        // go to next player
        self.current_player_idx = self.next_living_player();
    }

    fn next_living_player(&self) -> usize {
        let n = self.players.len();

        (1..=n)
            .map(|offset| (self.current_player_idx + offset) % n)
            .find(|&idx| self.players[idx].alive)
            .unwrap_or(self.current_player_idx)
    }
}

fn is_sub_multiset(cards: &[Character], pool: &[Character]) -> bool {
    let mut remaining = pool.to_vec();
    cards.iter().all(|card| match remaining.iter().position(|c| c == card) {
        Some(pos) => {
            remaining.swap_remove(pos);
            true
        }
        None => false,
    })
}

/// Distinct ways of keeping `keep` cards out of `pool`.
fn keep_choices(pool: &[Character], keep: usize) -> Vec<Vec<Character>> {
    fn pick(pool: &[Character], keep: usize, start: usize, chosen: &mut Vec<Character>, out: &mut Vec<Vec<Character>>) {
        if chosen.len() == keep {
            let mut choice = chosen.clone();
            choice.sort();
            out.push(choice);
            return;
        }
        for idx in start..pool.len() {
            chosen.push(pool[idx]);
            pick(pool, keep, idx + 1, chosen, out);
            chosen.pop();
        }
    }

    let mut out = vec![];
    pick(pool, keep, 0, &mut Vec::with_capacity(keep), &mut out);
    out.sort();
    out.dedup();
    out
}
