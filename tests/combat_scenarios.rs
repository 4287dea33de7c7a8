//! End-to-end combat scenarios driven through the public tick loop.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use duel_core::game::combat::{apply_hit, HitOutcome, Timeline};
use duel_core::game::events::{GameEvent, GameEventData, HitSource};
use duel_core::game::replay::Replay;
use duel_core::game::tick::tick;
use duel_core::game::variant::{AnimationId, HitSpec};
use duel_core::{
    AbilitySlot, Facing, Fighter, FighterSetup, HeldKeys, InputFrame, InputLatch, MatchConfig,
    MatchState, SimConfig, Side, VariantKind, TICK_DURATION,
};

const IDLE: [InputFrame; 2] = [InputFrame::new(), InputFrame::new()];

// =============================================================================
// HELPERS
// =============================================================================

fn duel_with(rules: MatchConfig, a: VariantKind, ax: f32, a_dir: Facing, b: VariantKind, bx: f32, b_dir: Facing) -> MatchState {
    let sim = SimConfig::default();
    let setups = [
        FighterSetup::on_floor(a, ax, a_dir, &sim),
        FighterSetup::on_floor(b, bx, b_dir, &sim),
    ];
    let mut state = MatchState::new(sim, rules, setups);
    // Settle: grounded is derived on the first update
    step(&mut state, 1);
    state
}

/// Arena whose floor spans almost wall to wall, for long dashes.
fn wide_duel(a: VariantKind, ax: f32, b: VariantKind, bx: f32) -> MatchState {
    let sim = SimConfig { floor_left: -150.0, floor_right: 1450.0, ..SimConfig::default() };
    let setups = [
        FighterSetup::on_floor(a, ax, Facing::Right, &sim),
        FighterSetup::on_floor(b, bx, Facing::Left, &sim),
    ];
    let mut state = MatchState::new(sim, MatchConfig::default(), setups);
    step(&mut state, 1);
    state
}

fn duel(a: VariantKind, ax: f32, b: VariantKind, bx: f32) -> MatchState {
    duel_with(MatchConfig::default(), a, ax, Facing::Right, b, bx, Facing::Left)
}

fn step(state: &mut MatchState, ticks: u32) -> Vec<GameEvent> {
    step_with(state, ticks, IDLE)
}

fn step_with(state: &mut MatchState, ticks: u32, inputs: [InputFrame; 2]) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(tick(state, &inputs, TICK_DURATION).events);
    }
    events
}

/// Step until `done` holds, at most `limit` ticks. Returns the events seen.
fn step_until(state: &mut MatchState, limit: u32, done: impl Fn(&MatchState) -> bool) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..limit {
        events.extend(tick(state, &IDLE, TICK_DURATION).events);
        if done(state) {
            return events;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

fn use_ability(state: &mut MatchState, side: Side, slot: AbilitySlot) -> bool {
    let MatchState { fighters, timeline, .. } = state;
    let fighter = &mut fighters[side.index()];
    match slot {
        AbilitySlot::Ability1 => fighter.ability1(timeline),
        AbilitySlot::Ability2 => fighter.ability2(timeline),
    }
}

fn count(events: &[GameEvent], pred: impl Fn(&GameEventData) -> bool) -> usize {
    events.iter().filter(|e| pred(&e.data)).count()
}

fn landed(data: &GameEventData) -> bool {
    matches!(data, GameEventData::StrikeLanded { .. })
}

// =============================================================================
// MELEE
// =============================================================================

#[test]
fn test_strike_in_range_damages_and_knocks_back() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);
    assert!(state.fighter(Side::Player).grounded);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step_until(&mut state, 120, |s| s.fighter(Side::Cpu).damage > 0.0);

    let b = state.fighter(Side::Cpu);
    assert_eq!(b.damage, 80.0);
    assert!(b.hurt);
    assert!(b.velocity.x > 0.0, "knocked along the attacker's facing");
    assert_eq!(count(&events, landed), 1);

    step(&mut state, 61);
    assert!(!state.fighter(Side::Cpu).hurt);
}

#[test]
fn test_shield_absorbs_strike() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);
    let shield = [InputFrame::new(), InputFrame::new().with_flags(InputFrame::FLAG_SHIELD)];

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step_with(&mut state, 120, shield);

    let b = state.fighter(Side::Cpu);
    assert_eq!(b.damage, 0.0);
    assert_eq!(b.velocity.x, 0.0);
    assert!(!b.hurt);
    assert_eq!(count(&events, landed), 0);
    assert_eq!(
        count(&events, |d| matches!(d, GameEventData::StrikeBlocked { source: HitSource::Melee, .. })),
        1
    );
}

#[test]
fn test_second_activation_during_windup_is_ignored() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    step(&mut state, 10);
    assert!(!use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    assert!(!use_ability(&mut state, Side::Player, AbilitySlot::Ability2));

    let events = step(&mut state, 200);
    assert_eq!(count(&events, landed), 1);
    assert_eq!(state.fighter(Side::Cpu).damage, 80.0);
}

#[test]
fn test_strike_out_of_range_misses() {
    let mut state = duel(VariantKind::Warrior, 200.0, VariantKind::Warrior, 700.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step(&mut state, 120);
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::StrikeMissed { .. })), 1);
}

#[test]
fn test_hurt_attacker_is_interrupted() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    step(&mut state, 80);
    state.fighter_mut(Side::Player).hurt = true;
    let events = step(&mut state, 30);

    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::AttackInterrupted { side: Side::Player })), 1);
    assert_eq!(state.fighter(Side::Player).attacking, None);
}

#[test]
fn test_attack_lock_released_after_cycle() {
    let mut state = duel(VariantKind::Warrior, 200.0, VariantKind::Warrior, 700.0);
    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));

    step_until(&mut state, 200, |s| s.fighter(Side::Player).attacking.is_none());
    assert_eq!(state.fighter(Side::Player).pending_phases, 0);
    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
}

// =============================================================================
// GENERATION GUARD
// =============================================================================

#[test]
fn test_rematch_discards_pending_strike() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    step(&mut state, 30);
    state.rematch();
    let events = step(&mut state, 150);

    // Fresh fighters overlap exactly as before, but the old strike never lands
    let a = state.fighter(Side::Player);
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(a.attacking, None);
    assert_eq!(a.pending_phases, 0);
    assert_eq!(count(&events, landed), 0);
    assert_eq!(state.timeline.pending(), 0);
}

#[test]
fn test_respawned_attacker_drops_old_phases() {
    let mut state = duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 140.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let old = state.fighter(Side::Player).generation;
    assert_eq!(state.timeline.pending_for(Side::Player, old), 1);

    state.respawn(Side::Player);
    let events = step(&mut state, 150);

    assert_ne!(state.fighter(Side::Player).generation, old);
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(count(&events, landed), 0);
}

// =============================================================================
// PHYSICS
// =============================================================================

#[test]
fn test_landing_snaps_exactly() {
    let mut state = duel(VariantKind::Archer, 400.0, VariantKind::Warrior, 800.0);
    let rest = state.sim.floor_y - 80.0;
    {
        let a = state.fighter_mut(Side::Player);
        a.position.y = rest - 1.5;
        a.velocity.y = 2.0;
        a.has_double_jump = false;
    }
    step(&mut state, 1);

    let a = state.fighter(Side::Player);
    assert_eq!(a.position.y, rest);
    assert_eq!(a.velocity.y, 0.0);
    assert!(a.grounded);
    assert!(a.has_double_jump);
}

#[test]
fn test_knocked_below_rest_snaps_back_up() {
    let mut state = duel(VariantKind::Warrior, 400.0, VariantKind::Warrior, 800.0);
    let rest = state.sim.floor_y - 80.0;
    {
        let a = state.fighter_mut(Side::Player);
        a.position.y = rest + 3.0;
        a.velocity.y = 2.0;
        a.grounded = false;
    }
    step(&mut state, 1);

    let a = state.fighter(Side::Player);
    assert_eq!(a.position.y, rest);
    assert_eq!(a.velocity.y, 0.0);
    assert!(a.grounded);

    step(&mut state, 60);
    let a = state.fighter(Side::Player);
    assert_eq!(a.position.y, rest);
    assert!(a.alive);
}

#[test]
fn test_jump_arc_returns_to_floor() {
    let mut state = duel(VariantKind::Warrior, 400.0, VariantKind::Warrior, 800.0);
    let jump = [InputFrame::new().with_flags(InputFrame::FLAG_JUMP), InputFrame::new()];
    step_with(&mut state, 1, jump);
    assert!(!state.fighter(Side::Player).grounded);
    assert_eq!(state.fighter(Side::Player).animation.id, AnimationId::Rise);

    step_until(&mut state, 120, |s| s.fighter(Side::Player).grounded);
    assert_eq!(state.fighter(Side::Player).position.y, state.sim.floor_y - 80.0);
}

#[test]
fn test_knockback_grows_with_damage() {
    let sim = SimConfig::default();
    let mut timeline = Timeline::new();
    let mut defender = Fighter::new(Side::Cpu, VariantKind::Warrior, 1, duel_core::Vec2::new(400.0, 520.0), Facing::Left, 3, 999.0);
    let hit = HitSpec { damage: 30.0, base_knockback: 2.0 };

    let first = apply_hit(&mut defender, hit, Facing::Right, &sim, &mut timeline);
    let second = apply_hit(&mut defender, hit, Facing::Right, &sim, &mut timeline);
    match (first, second) {
        (HitOutcome::Landed { knockback: k1, .. }, HitOutcome::Landed { knockback: k2, .. }) => {
            assert!(k2 > k1);
            assert_eq!(k1, 2.0 * (1.0 + 30.0 * 0.2));
        }
        other => panic!("expected two landed hits, got {other:?}"),
    }
}

// =============================================================================
// PROJECTILES
// =============================================================================

#[test]
fn test_arrow_hits_and_retires() {
    let mut state = duel(VariantKind::Archer, 300.0, VariantKind::Warrior, 700.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step_until(&mut state, 120, |s| s.fighter(Side::Cpu).damage > 0.0);

    assert_eq!(count(&events, |d| matches!(d, GameEventData::ProjectileFired { owner: Side::Player })), 1);
    assert_eq!(
        count(&events, |d| matches!(d, GameEventData::StrikeLanded { source: HitSource::Projectile, .. })),
        1
    );
    let b = state.fighter(Side::Cpu);
    assert_eq!(b.damage, 25.0);
    assert!(b.velocity.x > 0.0);
    assert!(state.fighter(Side::Player).projectiles.is_empty());
}

#[test]
fn test_shield_consumes_arrow() {
    let mut state = duel(VariantKind::Archer, 300.0, VariantKind::Warrior, 700.0);
    let shield = [InputFrame::new(), InputFrame::new().with_flags(InputFrame::FLAG_SHIELD)];

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step_with(&mut state, 100, shield);

    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(
        count(&events, |d| matches!(d, GameEventData::StrikeBlocked { source: HitSource::Projectile, .. })),
        1
    );
    assert!(state.fighter(Side::Player).projectiles.is_empty());
}

#[test]
fn test_respawned_archer_drops_arrows_in_flight() {
    let mut state = duel(VariantKind::Archer, 100.0, VariantKind::Warrior, 900.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    step_until(&mut state, 120, |s| !s.fighter(Side::Player).projectiles.is_empty());

    state.respawn(Side::Player);
    assert!(state.fighter(Side::Player).projectiles.is_empty());

    let events = step(&mut state, 60);
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
    assert_eq!(count(&events, landed), 0);
}

#[test]
fn test_missed_arrow_leaves_screen() {
    let mut state = duel_with(
        MatchConfig::default(),
        VariantKind::Archer, 900.0, Facing::Right,
        VariantKind::Warrior, 200.0, Facing::Right,
    );

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability1));
    let events = step_until(&mut state, 80, |s| !s.fighter(Side::Player).projectiles.is_empty());
    assert_eq!(count(&events, |d| matches!(d, GameEventData::ProjectileFired { .. })), 1);

    step_until(&mut state, 40, |s| s.fighter(Side::Player).projectiles.is_empty());
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
}

// =============================================================================
// MULTI-PHASE ABILITIES
// =============================================================================

#[test]
fn test_dash_strike_phase_chain() {
    let mut state = wide_duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, -100.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability2));
    step(&mut state, 10);
    {
        let a = state.fighter(Side::Player);
        assert_eq!(a.attacking, Some(AbilitySlot::Ability2));
        assert_eq!(a.max_speed, 20.0);
        assert_eq!(a.velocity.x, 20.0);
    }

    step_until(&mut state, 40, |s| s.fighter(Side::Player).attacking == Some(AbilitySlot::Ability1));
    {
        let a = state.fighter(Side::Player);
        assert_eq!(a.max_speed, 10.0);
        assert_eq!(a.animation.id, AnimationId::Ability1);
        assert!(a.animation.frame_index >= 9);
    }

    let events = step_until(&mut state, 30, |s| s.fighter(Side::Player).pending_phases == 0);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::StrikeMissed { attacker: Side::Player })), 1);

    step_until(&mut state, 120, |s| s.fighter(Side::Player).attacking.is_none());
}

#[test]
fn test_hurt_mid_dash_still_retags_but_deals_no_damage() {
    let mut state = wide_duel(VariantKind::Warrior, 100.0, VariantKind::Warrior, 1300.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability2));
    step(&mut state, 20);

    // Keep the attacker hurt through both phases
    let mut events = Vec::new();
    let mut retagged = false;
    for _ in 0..60 {
        state.fighter_mut(Side::Player).hurt = true;
        events.extend(tick(&mut state, &IDLE, TICK_DURATION).events);
        let a = state.fighter(Side::Player);
        if a.attacking == Some(AbilitySlot::Ability1) {
            retagged = true;
            assert_eq!(a.max_speed, 10.0);
        }
        if retagged && a.pending_phases == 0 {
            break;
        }
    }

    assert!(retagged, "dash window still hands over to the strike phase");
    assert_eq!(state.fighter(Side::Player).pending_phases, 0);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::AttackInterrupted { side: Side::Player })), 1);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::StrikeMissed { .. })), 0);
    assert_eq!(count(&events, landed), 0);
    assert_eq!(state.fighter(Side::Cpu).damage, 0.0);
}

#[test]
fn test_sprint_restores_speed_cap() {
    let mut state = wide_duel(VariantKind::Archer, -140.0, VariantKind::Warrior, 1300.0);

    assert!(use_ability(&mut state, Side::Player, AbilitySlot::Ability2));
    step(&mut state, 20);
    {
        let a = state.fighter(Side::Player);
        assert_eq!(a.max_speed, 22.5);
        assert_eq!(a.velocity.x, 22.5);
    }

    step_until(&mut state, 60, |s| s.fighter(Side::Player).max_speed == 15.0);
    let a = state.fighter(Side::Player);
    assert_eq!(a.attacking, None);
    assert!(a.velocity.x.abs() <= 1.0);
}

// =============================================================================
// ROUND RULES
// =============================================================================

#[test]
fn test_knockout_respawn_then_match_end() {
    let rules = MatchConfig { lives: 2, ..MatchConfig::default() };
    let mut state = duel_with(rules, VariantKind::Warrior, 300.0, Facing::Right, VariantKind::Archer, 800.0, Facing::Left);
    let first_generation = state.fighter(Side::Cpu).generation;

    state.fighter_mut(Side::Cpu).damage = state.rules.ko_damage;
    let events = step(&mut state, 1);
    assert_eq!(
        count(&events, |d| matches!(d, GameEventData::FighterKnockedOut { side: Side::Cpu, lives_left: 1 })),
        1
    );
    assert_eq!(state.fighter(Side::Cpu).animation.id, AnimationId::Death);

    let events = step_until(&mut state, 120, |s| s.fighter(Side::Cpu).generation != first_generation);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::FighterRespawned { side: Side::Cpu, lives: 1 })), 1);
    let cpu = state.fighter(Side::Cpu);
    assert_eq!(cpu.damage, 0.0);
    assert!(!cpu.is_knocked_out());

    state.fighter_mut(Side::Cpu).damage = state.rules.ko_damage;
    let result = tick(&mut state, &IDLE, TICK_DURATION);
    assert!(result.match_ended);
    assert_eq!(result.winner, Some(Side::Player));
}

#[test]
fn test_falling_off_stage_knocks_out() {
    let rules = MatchConfig { lives: 1, ..MatchConfig::default() };
    let mut state = duel_with(rules, VariantKind::Warrior, 300.0, Facing::Right, VariantKind::Warrior, 1200.0, Facing::Left);

    step_until(&mut state, 200, |s| s.is_ended());
    assert!(!state.fighter(Side::Cpu).alive);
    assert!(state.fighter(Side::Player).alive);
}

#[test]
fn test_knocked_out_fighter_ignores_controls() {
    let mut state = duel(VariantKind::Warrior, 300.0, VariantKind::Warrior, 800.0);
    state.fighter_mut(Side::Player).damage = state.rules.ko_damage;
    step(&mut state, 1);

    let position = state.fighter(Side::Player).position;
    let mash = InputFrame::with_movement(1)
        .with_flags(InputFrame::FLAG_JUMP | InputFrame::FLAG_ABILITY_1);
    let events = step_with(&mut state, 5, [mash, InputFrame::new()]);

    assert_eq!(state.fighter(Side::Player).position, position);
    assert_eq!(count(&events, |d| matches!(d, GameEventData::AbilityStarted { .. })), 0);
}

// =============================================================================
// INPUT / REPLAY
// =============================================================================

#[test]
fn test_held_ability_key_fires_once() {
    let mut state = duel(VariantKind::Warrior, 200.0, VariantKind::Warrior, 800.0);
    let mut latch = InputLatch::new();
    let held = HeldKeys { ability1: true, ..HeldKeys::default() };

    let mut events = Vec::new();
    for _ in 0..300 {
        let inputs = [latch.frame(held), InputFrame::new()];
        events.extend(tick(&mut state, &inputs, TICK_DURATION).events);
    }
    assert_eq!(count(&events, |d| matches!(d, GameEventData::AbilityStarted { .. })), 1);
}

#[test]
fn test_random_match_replays_identically() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut state = MatchState::with_variants(VariantKind::Warrior, VariantKind::Archer);
    let mut replay = Replay::new(&state, TICK_DURATION);

    for _ in 0..900 {
        let inputs = [random_frame(&mut rng), random_frame(&mut rng)];
        tick(&mut state, &inputs, TICK_DURATION);
        replay.record(inputs, &state);
    }
    replay.finalize(&state);

    let (rerun, _) = replay.run();
    assert_eq!(rerun.compute_hash(), state.compute_hash());
    assert_eq!(replay.verify().unwrap(), state.compute_hash());
}

fn random_frame(rng: &mut StdRng) -> InputFrame {
    let mut frame = InputFrame::with_movement(rng.gen_range(-1..=1));
    frame.set_jump(rng.gen_bool(0.05));
    frame.set_shield(rng.gen_bool(0.1));
    frame.set_ability1(rng.gen_bool(0.03));
    frame.set_ability2(rng.gen_bool(0.02));
    frame
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn frame_strategy() -> impl Strategy<Value = InputFrame> {
    (-1i8..=1, 0u8..16).prop_map(|(move_x, flags)| InputFrame::with_movement(move_x).with_flags(flags))
}

proptest! {
    #[test]
    fn prop_frame_index_within_clip(frames in prop::collection::vec((frame_strategy(), frame_strategy()), 1..400)) {
        let mut state = MatchState::with_variants(VariantKind::Warrior, VariantKind::Archer);
        for (player, cpu) in frames {
            tick(&mut state, &[player, cpu], TICK_DURATION);
            for side in Side::ALL {
                let f = state.fighter(side);
                let clip = f.spec().animations.clip(f.animation.id);
                prop_assert!(f.animation.frame_index <= f.animation.max_frame);
                prop_assert_eq!(f.animation.max_frame, clip.max_frame());
            }
        }
    }

    #[test]
    fn prop_idle_fighters_stay_idle(ticks in 1u32..600) {
        let mut state = MatchState::with_variants(VariantKind::Warrior, VariantKind::Archer);
        for _ in 0..ticks {
            tick(&mut state, &IDLE, TICK_DURATION);
            for side in Side::ALL {
                let f = state.fighter(side);
                prop_assert!(f.attacking.is_none());
                prop_assert!(!f.hurt);
                prop_assert_eq!(f.velocity.x, 0.0);
            }
        }
    }

    #[test]
    fn prop_knockback_monotonic_in_damage(prior in 0u32..500, extra in 1u32..500) {
        let sim = SimConfig::default();
        let hit = HitSpec { damage: 25.0, base_knockback: 5.0 };
        let mut timeline = Timeline::new();

        let mut low = Fighter::new(Side::Cpu, VariantKind::Warrior, 1, duel_core::Vec2::new(400.0, 520.0), Facing::Left, 3, 9999.0);
        let mut high = low.clone();
        low.damage = prior as f32;
        high.damage = (prior + extra) as f32;

        let k_low = apply_hit(&mut low, hit, Facing::Left, &sim, &mut timeline);
        let k_high = apply_hit(&mut high, hit, Facing::Left, &sim, &mut timeline);
        match (k_low, k_high) {
            (HitOutcome::Landed { knockback: a, .. }, HitOutcome::Landed { knockback: b, .. }) => {
                prop_assert!(b.abs() > a.abs());
                prop_assert!(a < 0.0 && b < 0.0);
            }
            _ => prop_assert!(false, "unshielded hits must land"),
        }
    }
}
