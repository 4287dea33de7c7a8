//! Duel Simulator
//!
//! Headless driver for the simulation core. Runs a scripted match between a
//! warrior and an archer, records it, and re-simulates the recording to check
//! that the state hashes agree.
//!
//! Usage: `duel-sim [config.json]`

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use duel_core::{
    Config, FighterSetup, HeldKeys, InputLatch, MatchState, Side, VariantKind,
    TICK_DURATION, TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        replay::Replay,
        tick::tick,
    },
};

/// Demo length (two minutes of simulated time).
const DEMO_TICKS: u32 = 120 * TICK_RATE;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Duel Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading config from {path}"))?,
        None => Config::default(),
    };

    demo_match(config)
}

/// Scripted keys for one side: walk toward the opponent, attack in range,
/// shield when the opponent is winding up.
fn script(state: &MatchState, side: Side, t: u32) -> HeldKeys {
    let me = state.fighter(side);
    let them = state.opponent(side);
    let gap = them.position.x - me.position.x;
    let in_range = gap.abs() < me.spec().attack_range_width + me.spec().body.x;

    let mut keys = HeldKeys::default();
    if them.attacking.is_some() && in_range && t % 3 == 0 {
        keys.shield = true;
        return keys;
    }

    if !in_range || me.variant == VariantKind::Archer {
        keys.right = gap > 0.0;
        keys.left = gap < 0.0;
    }
    keys.jump = t % 150 == 0;
    keys.ability1 = in_range || (me.variant == VariantKind::Archer && t % 70 == 0);
    keys.ability2 = t % 240 == 120;
    keys
}

/// Run a scripted match and verify it replays to the same hash.
fn demo_match(config: Config) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let setups = FighterSetup::default_pair(VariantKind::Warrior, VariantKind::Archer, &config.sim);
    let mut state = MatchState::new(config.sim, config.match_rules, setups);
    let mut replay = Replay::new(&state, TICK_DURATION);
    let mut latches = [InputLatch::new(), InputLatch::new()];

    for side in Side::ALL {
        let fighter = state.fighter(side);
        info!(
            "{:?}: {} at ({:.1}, {:.1})",
            side,
            fighter.spec().name,
            fighter.position.x,
            fighter.position.y
        );
    }

    let mut hits = 0;
    for t in 0..DEMO_TICKS {
        let inputs = [
            latches[0].frame(script(&state, Side::Player, t)),
            latches[1].frame(script(&state, Side::Cpu, t)),
        ];

        let result = tick(&mut state, &inputs, TICK_DURATION);
        replay.record(inputs, &state);

        for event in &result.events {
            match &event.data {
                GameEventData::StrikeLanded { attacker, total_damage, .. } => {
                    hits += 1;
                    info!("Tick {}: {:?} hit (defender damage {:.0})", event.tick, attacker, total_damage);
                }
                GameEventData::MatchEnded { winner, .. } => {
                    info!("Match ended! Winner: {:?}", winner);
                }
                _ => {}
            }
        }

        if result.match_ended {
            break;
        }
    }
    replay.finalize(&state);

    // Print final results
    info!("=== Match Results ===");
    for side in Side::ALL {
        let fighter = state.fighter(side);
        info!("{:?}: damage {:.0}, lives {}", side, fighter.damage, fighter.lives);
    }
    info!("Hits landed: {}", hits);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying the encoded recording
    info!("=== Verifying Determinism ===");
    let bytes = replay.to_bytes().context("encoding replay")?;
    info!("Replay size: {} bytes, {} frames", bytes.len(), replay.frames.len());
    info!("Input Hash: {}", hex::encode(replay.input_hash()));

    let decoded = Replay::from_bytes(&bytes)?;
    let replay_hash = decoded.verify()?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
