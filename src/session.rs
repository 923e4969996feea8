//! Owns one rules engine per room and serializes the actions submitted to it.
//!
//! The room map is only locked long enough to find, insert or drop a room. Each room sits
//! behind its own mutex, so rooms play in parallel while actions within a room are applied
//! one at a time in the order they arrive.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use crate::{Action, Coup, CoupError, GameView, HubConfig, Notification, PlayerId, Seat};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        RoomId(value.to_string())
    }
}

impl Display for RoomId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("room {0} has no game running")]
    RoomNotFound(RoomId),
    #[error("room {0} already has a game running")]
    RoomExists(RoomId),
    #[error(transparent)]
    Rejected(#[from] CoupError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "player", rename_all = "snake_case")]
pub enum Recipient {
    Everyone,
    Player(PlayerId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    State { view: GameView },
    Notice { notification: Notification },
}

/// Something the transport has to deliver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub room: RoomId,
    pub recipient: Recipient,
    pub event: HubEvent,
}

struct Room {
    game: Coup,
    rng: Pcg64,
    last_activity: Instant,
}

pub struct Hub {
    config: HubConfig,
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    games_started: AtomicU64,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(HashMap::new()),
            games_started: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn start_game(&self, room_id: RoomId, roster: &[Seat]) -> Result<Vec<Envelope>, HubError> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if rooms.contains_key(&room_id) {
            return Err(HubError::RoomExists(room_id));
        }

        let game_number = self.games_started.fetch_add(1, Ordering::Relaxed);
        let mut rng = match self.config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed.wrapping_add(game_number)),
            None => Pcg64::from_entropy(),
        };

        let game = Coup::new(roster, self.config.rules, &mut rng)?;
        let outbound = outbound(&room_id, &game);

        info!(room = %room_id, players = roster.len(), "game started");
        rooms.insert(room_id, Arc::new(Mutex::new(Room {
            game,
            rng,
            last_activity: Instant::now(),
        })));

        Ok(outbound)
    }

    fn room(&self, room_id: &RoomId) -> Result<Arc<Mutex<Room>>, HubError> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room_id)
            .cloned()
            .ok_or_else(|| HubError::RoomNotFound(room_id.clone()))
    }

    /// Applies one action to the room's game. A rejected action leaves the room untouched.
    pub fn submit(&self, room_id: &RoomId, action: Action) -> Result<Vec<Envelope>, HubError> {
        let handle = self.room(room_id)?;
        let mut room = handle.lock().unwrap_or_else(PoisonError::into_inner);
        let Room { game, rng, last_activity } = &mut *room;

        match game.apply_action(action.clone(), rng) {
            Ok(next) => {
                *game = next;
                *last_activity = Instant::now();
                debug!(room = %room_id, ?action, phase = ?game.phase(), "action applied");
                Ok(outbound(room_id, game))
            }
            Err(err @ CoupError::DeckExhausted { .. }) => {
                error!(room = %room_id, ?action, %err, "deck ran out, game state is inconsistent");
                Err(err.into())
            }
            Err(err) => {
                warn!(room = %room_id, ?action, %err, "action rejected");
                Err(err.into())
            }
        }
    }

    /// The current state as one player sees it, e.g. after a reconnect.
    pub fn snapshot(&self, room_id: &RoomId, viewer: PlayerId) -> Result<GameView, HubError> {
        let handle = self.room(room_id)?;
        let room = handle.lock().unwrap_or_else(PoisonError::into_inner);
        if room.game.player(viewer).is_none() {
            return Err(CoupError::UnknownPlayer(viewer).into());
        }

        Ok(room.game.view(viewer))
    }

    pub fn actions(&self, room_id: &RoomId) -> Result<Vec<Action>, HubError> {
        let handle = self.room(room_id)?;
        let room = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(room.game.actions())
    }

    pub fn winner(&self, room_id: &RoomId) -> Result<Option<PlayerId>, HubError> {
        let handle = self.room(room_id)?;
        let room = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(room.game.winner())
    }

    pub fn end_game(&self, room_id: &RoomId) -> bool {
        let removed = self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(room_id)
            .is_some();

        if removed {
            info!(room = %room_id, "game ended");
        }
        removed
    }

    /// Drops every room that has gone without an accepted action for longer than the idle timeout.
    pub fn sweep_idle(&self, now: Instant) -> Vec<RoomId> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let idle: Vec<RoomId> = rooms
            .iter()
            .filter(|(_, handle)| {
                let room = handle.lock().unwrap_or_else(PoisonError::into_inner);
                now.saturating_duration_since(room.last_activity) > self.config.idle_timeout
            })
            .map(|(room_id, _)| room_id.clone())
            .collect();

        for room_id in &idle {
            rooms.remove(room_id);
            info!(room = %room_id, "reclaimed idle room");
        }

        idle
    }
}

fn outbound(room_id: &RoomId, game: &Coup) -> Vec<Envelope> {
    let views = game.players().iter().map(|player| Envelope {
        room: room_id.clone(),
        recipient: Recipient::Player(player.id()),
        event: HubEvent::State { view: game.view(player.id()) },
    });

    let notices = game.notifications().iter().map(|notification| Envelope {
        room: room_id.clone(),
        recipient: notification.recipient().map_or(Recipient::Everyone, Recipient::Player),
        event: HubEvent::Notice { notification: notification.clone() },
    });

    views.chain(notices).collect()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};
    use crate::{Action, CoupError, HubConfig, InfluenceLoss, Notification, PlayerId, Rejection, RulesConfig, Seat};
    use super::{Hub, HubError, HubEvent, Recipient, RoomId};

    fn hub() -> Hub {
        Hub::new(HubConfig {
            seed: Some(17),
            idle_timeout: Duration::from_secs(60),
            ..HubConfig::default()
        })
    }

    fn roster() -> Vec<Seat> {
        vec![Seat::new(1, "ada"), Seat::new(2, "bo"), Seat::new(3, "cy")]
    }

    #[test]
    fn start_game_sends_everyone_their_view() {
        let hub = hub();
        let outbound = hub.start_game(RoomId::from("lobby-1"), &roster()).unwrap();

        assert_eq!(outbound.len(), 3);
        for envelope in &outbound {
            let Recipient::Player(player_id) = envelope.recipient else {
                panic!("state should be addressed to a player");
            };
            let HubEvent::State { view } = &envelope.event else {
                panic!("expected a state event");
            };
            assert_eq!(view.viewer, player_id);
        }
        assert_eq!(hub.room_count(), 1);
    }

    #[test]
    fn rooms_are_unique() {
        let hub = hub();
        hub.start_game(RoomId::from("a"), &roster()).unwrap();

        assert!(matches!(hub.start_game(RoomId::from("a"), &roster()), Err(HubError::RoomExists(_))));
        assert!(matches!(
            hub.start_game(RoomId::from("b"), &roster()[..1]),
            Err(HubError::Rejected(CoupError::InvalidPlayerCount(1)))
        ));
        assert_eq!(hub.room_count(), 1);
    }

    #[test]
    fn submit_applies_in_order_and_rejects_atomically() {
        let hub = hub();
        let room = RoomId::from("r");
        hub.start_game(room.clone(), &roster()).unwrap();

        hub.submit(&room, Action::Income(PlayerId(1))).unwrap();
        let err = hub.submit(&room, Action::Income(PlayerId(1))).unwrap_err();
        assert!(matches!(err, HubError::Rejected(CoupError::InvalidAction(Rejection::NotYourTurn))));

        let view = hub.snapshot(&room, PlayerId(1)).unwrap();
        assert_eq!(view.players[0].balance, 3);
        assert_eq!(view.current_player, PlayerId(2));
        assert_eq!(view.turn, 1);
    }

    #[test]
    fn choice_prompts_go_to_one_player() {
        let hub = Hub::new(HubConfig {
            seed: Some(4),
            rules: RulesConfig { influence_loss: InfluenceLoss::PlayerChoice },
            ..HubConfig::default()
        });
        let room = RoomId::from("r");
        hub.start_game(room.clone(), &roster()).unwrap();

        // income up to a coup
        for _ in 0..5 {
            for id in 1..=3 {
                hub.submit(&room, Action::Income(PlayerId(id))).unwrap();
            }
        }

        let outbound = hub.submit(&room, Action::Coup(PlayerId(1), PlayerId(2))).unwrap();
        let prompt = outbound
            .iter()
            .find(|envelope| matches!(envelope.event, HubEvent::Notice { notification: Notification::ChooseInfluenceToLose { .. } }))
            .expect("coup victim should be asked to pick a card");
        assert_eq!(prompt.recipient, Recipient::Player(PlayerId(2)));

        let json = serde_json::to_value(prompt).unwrap();
        assert_eq!(json["recipient"]["kind"], "player");
        assert_eq!(json["event"]["notification"]["type"], "choose_influence_to_lose");
    }

    #[test]
    fn unknown_rooms_and_viewers() {
        let hub = hub();
        let room = RoomId::from("r");
        assert!(matches!(hub.submit(&room, Action::Income(PlayerId(1))), Err(HubError::RoomNotFound(_))));

        hub.start_game(room.clone(), &roster()).unwrap();
        assert!(matches!(
            hub.snapshot(&room, PlayerId(9)),
            Err(HubError::Rejected(CoupError::UnknownPlayer(PlayerId(9))))
        ));
    }

    #[test]
    fn idle_rooms_are_swept() {
        let hub = hub();
        hub.start_game(RoomId::from("quiet"), &roster()).unwrap();
        hub.start_game(RoomId::from("busy"), &roster()).unwrap();

        assert!(hub.sweep_idle(Instant::now()).is_empty());

        let later = Instant::now() + Duration::from_secs(61);
        let mut swept = hub.sweep_idle(later);
        swept.sort();
        assert_eq!(swept, vec![RoomId::from("busy"), RoomId::from("quiet")]);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn end_game_drops_the_room() {
        let hub = hub();
        hub.start_game(RoomId::from("r"), &roster()).unwrap();

        assert!(hub.end_game(&RoomId::from("r")));
        assert!(!hub.end_game(&RoomId::from("r")));
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn rooms_play_in_parallel() {
        let hub = hub();
        let rooms: Vec<RoomId> = (0..8).map(|n| RoomId(format!("room-{n}"))).collect();
        for room in &rooms {
            hub.start_game(room.clone(), &roster()).unwrap();
        }

        std::thread::scope(|scope| {
            for room in &rooms {
                let hub = &hub;
                scope.spawn(move || {
                    for _ in 0..3 {
                        for id in 1..=3 {
                            hub.submit(room, Action::Income(PlayerId(id))).unwrap();
                        }
                    }
                });
            }
        });

        for room in &rooms {
            let view = hub.snapshot(room, PlayerId(3)).unwrap();
            assert!(view.players.iter().all(|player| player.balance == 5));
            assert_eq!(view.turn, 9);
        }
    }
}
