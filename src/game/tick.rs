//! Simulation Tick
//!
//! The fixed-step game loop. Each call advances the clock by `dt` and runs
//! the phases below in order. Same state plus same inputs gives the same
//! result, which is what replay verification relies on.

use std::time::Duration;
use tracing::{info, trace};

use crate::game::combat::{self, Effect, Timeline};
use crate::game::events::{GameEvent, HitSource};
use crate::game::fighter::{AbilitySlot, Fighter};
use crate::game::input::InputFrame;
use crate::game::state::{MatchPhase, MatchState, Side};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match has ended
    pub match_ended: bool,
    /// Winner (if the match ended with one)
    pub winner: Option<Side>,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The match state (will be mutated)
/// * `inputs` - One frame per side, indexed by `Side::index`
/// * `dt` - Simulated time this tick covers
pub fn tick(state: &mut MatchState, inputs: &[InputFrame; 2], dt: Duration) -> TickResult {
    let mut result = TickResult::default();

    if let MatchPhase::Ended { winner } = state.phase {
        result.match_ended = true;
        result.winner = winner;
        return result;
    }

    // 0. Advance tick counter and clock
    state.tick += 1;
    state.timeline.advance(dt);

    // 1. Deferred effects due by now
    run_due_effects(state);

    // 2. Apply inputs
    for side in Side::ALL {
        apply_input(state, side, &inputs[side.index()]);
    }

    // 3. Update fighters
    let sim = state.sim.clone();
    for fighter in state.fighters.iter_mut() {
        fighter.update(&sim);
    }

    // 4. Projectiles
    update_projectiles(state);

    // 5. Round rules
    check_knockouts(state, &mut result);

    result.events = state.take_events();
    result
}

/// Drain and apply every effect due at the current time.
///
/// Effects scheduled while applying (e.g. the strike queued by a dash) are
/// picked up in the same pass if they are already due.
fn run_due_effects(state: &mut MatchState) {
    loop {
        let due = state.timeline.drain_due();
        if due.is_empty() {
            break;
        }
        for entry in due {
            combat::apply_effect(state, entry);
        }
    }
}

/// Apply one fighter's input frame: move, jump, shield, ability 1, ability 2.
fn apply_input(state: &mut MatchState, side: Side, input: &InputFrame) {
    let tick = state.tick;
    let MatchState { fighters, timeline, pending_events, .. } = state;
    let fighter = &mut fighters[side.index()];

    fighter.release_shield();
    fighter.move_x(input.move_direction());
    if input.jump_pressed() {
        fighter.jump();
    }
    if input.shield_held() {
        fighter.shield();
    }
    if input.ability1_pressed() && fighter.ability1(timeline) {
        pending_events.push(GameEvent::ability_started(tick, side, AbilitySlot::Ability1));
    }
    if input.ability2_pressed() && fighter.ability2(timeline) {
        pending_events.push(GameEvent::ability_started(tick, side, AbilitySlot::Ability2));
    }
}

/// Move projectiles and resolve contact with the opponent.
fn update_projectiles(state: &mut MatchState) {
    let tick = state.tick;
    let MatchState { fighters, timeline, sim, pending_events, .. } = state;

    for side in Side::ALL {
        let (owner, target) = Side::split_mut(fighters, side);
        for projectile in owner.projectiles.iter_mut() {
            if projectile.generation != owner.generation {
                trace!(?side, spawned = projectile.generation, current = owner.generation, "Dropping stale projectile");
                projectile.retire();
                continue;
            }
            projectile.advance(sim);
            if !projectile.live || target.is_knocked_out() {
                continue;
            }
            if projectile.rect().overlaps(&target.hitbox()) {
                let outcome = combat::apply_hit(target, projectile.hit, projectile.direction, sim, timeline);
                projectile.retire();
                pending_events.push(combat::hit_event(tick, side, target, HitSource::Projectile, outcome));
            }
        }
        owner.projectiles.retain(|p| p.live);
    }
}

/// Handle fresh knockouts: queue a respawn or end the match.
fn check_knockouts(state: &mut MatchState, result: &mut TickResult) {
    let mut out_of_lives = [false; 2];

    for side in Side::ALL {
        let tick = state.tick;
        let MatchState { fighters, timeline, rules, pending_events, .. } = &mut *state;
        let fighter = &mut fighters[side.index()];
        if fighter.ko_handled || !fighter.is_knocked_out() {
            continue;
        }
        fighter.ko_handled = true;

        let lives_left = fighter.lives.saturating_sub(1);
        info!(?side, lives_left, damage = fighter.damage, alive = fighter.alive, "Fighter knocked out");
        pending_events.push(GameEvent::knocked_out(tick, side, lives_left));

        if lives_left == 0 {
            out_of_lives[side.index()] = true;
        } else if rules.auto_respawn {
            schedule_respawn(timeline, fighter, rules.respawn_delay());
        }
    }

    let winner = match out_of_lives {
        [false, false] => return,
        [true, true] => None,
        [true, false] => Some(Side::Cpu),
        [false, true] => Some(Side::Player),
    };
    end_match(state, result, winner);
}

fn schedule_respawn(timeline: &mut Timeline, fighter: &Fighter, delay: Duration) {
    timeline.schedule(delay, fighter.side, fighter.generation, Effect::Respawn);
}

/// End the match.
fn end_match(state: &mut MatchState, result: &mut TickResult, winner: Option<Side>) {
    state.phase = MatchPhase::Ended { winner };
    result.match_ended = true;
    result.winner = winner;

    info!(tick = state.tick, ?winner, "Match ended");
    state.push_event(GameEvent::match_ended(state.tick, winner));
}

/// Replay a match from recorded inputs.
///
/// One tick per recorded frame pair. Stops early if the match ends.
pub fn replay_match(
    initial_state: MatchState,
    frames: &[[InputFrame; 2]],
    dt: Duration,
) -> (MatchState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for inputs in frames {
        let result = tick(&mut state, inputs, dt);
        all_events.extend(result.events);

        if result.match_ended {
            break;
        }
    }

    (state, all_events)
}
