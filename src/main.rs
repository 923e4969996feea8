use anyhow::{bail, Context};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use coup_hub::{Envelope, Hub, HubConfig, HubEvent, RoomId, Seat};

const MAX_STEPS: usize = 10_000;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HubConfig::from_env();
    info!(?config, "starting self-play room");

    let mut rng = match config.seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    };

    let roster: Vec<Seat> = (0..config.demo_players as u64)
        .map(|id| Seat::new(id, format!("bot {id}")))
        .collect();

    let hub = Hub::new(config);
    let room = RoomId::from("demo");
    hub.start_game(room.clone(), &roster).context("starting the demo game")?;

    for step in 0..MAX_STEPS {
        if let Some(winner) = hub.winner(&room)? {
            info!(%winner, step, "game over");
            hub.end_game(&room);
            return Ok(());
        }

        let mut actions = hub.actions(&room)?;
        if actions.is_empty() {
            bail!("no actions generated during unfinished game");
        }

        let random_action = actions.swap_remove(rng.gen_range(0..actions.len()));
        let outbound = hub.submit(&room, random_action)?;
        publish(&outbound)?;
    }

    bail!("game did not finish within {MAX_STEPS} actions")
}

// stands in for the transport: notices are logged, per-player state only at debug
fn publish(outbound: &[Envelope]) -> anyhow::Result<()> {
    for envelope in outbound {
        let json = serde_json::to_string(envelope)?;
        match envelope.event {
            HubEvent::Notice { .. } => info!(room = %envelope.room, "{json}"),
            HubEvent::State { .. } => debug!(room = %envelope.room, "{json}"),
        }
    }
    Ok(())
}
