//! Invariants that must hold at every step of any legal game.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use coup_hub::{Action, Coup, InfluenceLoss, PlayerId, RulesConfig, Seat, DECK_SIZE, FORCED_COUP_BALANCE};

fn roster(num_players: u64) -> Vec<Seat> {
    (0..num_players).map(|id| Seat::new(id, format!("seat {id}"))).collect()
}

fn card_count(game: &Coup) -> usize {
    game.deck().len()
        + game.players().iter().map(|p| p.hidden().len() + p.revealed().len()).sum::<usize>()
}

fn balance(game: &Coup, player_id: PlayerId) -> u32 {
    game.player(player_id).map(|p| p.balance()).unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_games_keep_invariants(seed in any::<u64>(), num_players in 2u64..=6, automatic in any::<bool>()) {
        let rules = RulesConfig {
            influence_loss: if automatic { InfluenceLoss::Automatic } else { InfluenceLoss::PlayerChoice },
        };
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut game = Coup::new(&roster(num_players), rules, &mut rng).unwrap();

        for _ in 0..1000 {
            prop_assert_eq!(card_count(&game), DECK_SIZE);

            let alive: Vec<PlayerId> = game.players().iter().filter(|p| p.is_alive()).map(|p| p.id()).collect();
            for player in game.players() {
                prop_assert_eq!(player.is_alive(), !player.hidden().is_empty());
            }

            if let Some(winner) = game.winner() {
                prop_assert_eq!(alive, vec![winner]);
                prop_assert!(game.actions().is_empty());
                prop_assert!(!game.validate_action(&Action::Income(winner)));
                break;
            }
            prop_assert!(alive.len() >= 2);

            let actions = game.actions();
            prop_assert!(!actions.is_empty(), "no actions generated during unfinished game");

            if game.pending().is_none() && game.interrupt().is_none() && game.current_player().balance() >= FORCED_COUP_BALANCE {
                prop_assert!(actions.iter().all(|a| matches!(a, Action::Coup(_, _))));
            }

            let action = actions[rng.gen_range(0..actions.len())].clone();
            let before = game.clone();
            game = game.apply_action(action.clone(), &mut rng).unwrap();

            // nobody comes back
            for (was, is) in before.players().iter().zip(game.players()) {
                prop_assert!(was.is_alive() || !is.is_alive());
            }

            if let Action::Coup(player_id, _) = action {
                prop_assert_eq!(balance(&game, player_id), balance(&before, player_id) - 7);
                prop_assert!(game.pending().is_none());
            }
        }
    }
}

#[test]
fn complete_game() {
    let mut rng = Pcg64::seed_from_u64(2024);
    let mut coup = Coup::new(&roster(4), RulesConfig::default(), &mut rng).unwrap();

    for _ in 0..10 {
        let mut actions = coup.actions();
        if actions.is_empty() {
            panic!("no actions generated during unfinished game")
        }

        let random_index = rng.gen_range(0..actions.len());
        let random_action = actions.remove(random_index);

        coup = coup.apply_action(random_action, &mut rng).unwrap();

        if coup.winner().is_some() {
            break;
        }
    }
}
