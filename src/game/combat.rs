//! Combat Resolver
//!
//! Ability activation, deferred ability phases and hit application.
//!
//! Every delayed continuation (strike resolution, projectile release, dash
//! phase change, sprint end, hurt recovery, respawn) is queued on the
//! `Timeline` stamped with the target fighter's generation. The tick driver
//! drains due effects at the start of a tick; an effect whose generation no
//! longer matches the fighter is dropped, so a respawn or rematch can never be
//! touched by a continuation scheduled for the previous instance.

use std::time::Duration;
use serde::{Serialize, Deserialize};
use tracing::{debug, trace};

use crate::config::SimConfig;
use crate::core::scheduler::{Scheduled, Scheduler};
use crate::game::animation;
use crate::game::events::{GameEvent, HitSource};
use crate::game::fighter::{AbilitySlot, Facing, Fighter};
use crate::game::projectile::Projectile;
use crate::game::state::{MatchState, Side};
use crate::game::variant::{AbilitySpec, AnimationId, HitSpec, ProjectileSpec};

/// Horizontal velocity multiplier applied when a dash begins.
pub const DASH_ENTRY_SCALE: f32 = 1.5;

// =============================================================================
// EFFECTS / TIMELINE
// =============================================================================

/// A deferred continuation.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Hit-test the attack range; optionally step forward afterwards
    ResolveStrike {
        /// Hit delivered on contact
        hit: HitSpec,
        /// Step forward after resolving
        follow_through: bool,
    },
    /// Release a projectile
    FireProjectile {
        /// Projectile to spawn
        projectile: ProjectileSpec,
    },
    /// Dash window over: switch to the strike phase
    BeginStrikePhase {
        /// Frame of the strike clip to start on
        strike_frame: u8,
        /// Delay until the hit test
        strike_delay: Duration,
        /// Hit delivered on contact
        hit: HitSpec,
    },
    /// Sprint over: restore the speed cap
    EndSprint,
    /// Hurt recovery
    ClearHurt,
    /// Bring a knocked-out fighter back
    Respawn,
}

impl Effect {
    /// Whether this effect is an ability phase that holds the attack lock.
    pub fn holds_attack_lock(&self) -> bool {
        matches!(
            self,
            Effect::ResolveStrike { .. }
                | Effect::FireProjectile { .. }
                | Effect::BeginStrikePhase { .. }
                | Effect::EndSprint
        )
    }
}

/// Simulation clock plus the queue of deferred effects.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    now: Duration,
    queue: Scheduler<Side, Effect>,
}

impl Timeline {
    /// Empty timeline at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance the clock.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Queue `effect` for `target` after `delay`.
    pub fn schedule(&mut self, delay: Duration, target: Side, generation: u32, effect: Effect) {
        self.queue.schedule(self.now, delay, target, generation, effect);
    }

    /// Queue an ability phase for `fighter`, holding its attack lock.
    pub fn schedule_phase(&mut self, fighter: &mut Fighter, delay: Duration, effect: Effect) {
        fighter.pending_phases += 1;
        self.schedule(delay, fighter.side, fighter.generation, effect);
    }

    /// Remove every effect due now, in fire order.
    pub fn drain_due(&mut self) -> Vec<Scheduled<Side, Effect>> {
        self.queue.drain_due(self.now)
    }

    /// Queued effects.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queued effects targeting `side` with `generation`.
    pub fn pending_for(&self, side: Side, generation: u32) -> usize {
        self.queue
            .iter()
            .filter(|e| e.target == side && e.generation == generation)
            .count()
    }
}

// =============================================================================
// ABILITY ACTIVATION
// =============================================================================

/// Try to start an ability. Returns whether it was accepted.
///
/// Rejected while another ability holds the lock, or while hurt, shielding
/// or knocked out.
pub fn begin_ability(fighter: &mut Fighter, slot: AbilitySlot, timeline: &mut Timeline) -> bool {
    if fighter.attacking.is_some()
        || fighter.hurt
        || fighter.shielding
        || fighter.is_knocked_out()
    {
        return false;
    }

    fighter.attacking = Some(slot);
    animation::play(fighter, slot.animation(), 0);

    match *fighter.ability(slot) {
        AbilitySpec::Strike { windup, hit } => {
            fighter.velocity.x = 0.0;
            timeline.schedule_phase(fighter, windup, Effect::ResolveStrike { hit, follow_through: false });
        }
        AbilitySpec::Shot { windup, projectile } => {
            fighter.velocity.x = 0.0;
            timeline.schedule_phase(fighter, windup, Effect::FireProjectile { projectile });
        }
        AbilitySpec::DashStrike { dash_speed, dash_window, strike_frame, strike_delay, hit } => {
            fighter.velocity.x *= DASH_ENTRY_SCALE;
            fighter.max_speed = dash_speed;
            let sign = fighter.direction.sign();
            fighter.push_horizontal(sign);
            timeline.schedule_phase(
                fighter,
                dash_window,
                Effect::BeginStrikePhase { strike_frame, strike_delay, hit },
            );
        }
        AbilitySpec::Sprint { speed_scale, duration } => {
            fighter.velocity.x *= speed_scale;
            fighter.max_speed = fighter.spec().max_speed * speed_scale;
            timeline.schedule_phase(fighter, duration, Effect::EndSprint);
        }
    }

    debug!(
        side = ?fighter.side,
        ?slot,
        variant = fighter.spec().name,
        "Ability started"
    );
    true
}

// =============================================================================
// HIT APPLICATION
// =============================================================================

/// Outcome of applying a hit to a defender.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Shield absorbed the hit
    Blocked,
    /// Damage and knockback applied
    Landed {
        /// Damage added
        damage: f32,
        /// Horizontal velocity added (signed)
        knockback: f32,
    },
}

/// Knockback for a hit on a defender already carrying `damage`.
#[inline]
pub fn knockback(base: f32, damage: f32, scale: f32, direction: Facing) -> f32 {
    base * (1.0 + damage * scale) * direction.sign()
}

/// Apply `hit` travelling in `direction` to `defender`.
///
/// A raised shield absorbs it entirely. Otherwise damage accumulates first
/// and the knockback scales with the new total.
pub fn apply_hit(
    defender: &mut Fighter,
    hit: HitSpec,
    direction: Facing,
    sim: &SimConfig,
    timeline: &mut Timeline,
) -> HitOutcome {
    if defender.shielding {
        return HitOutcome::Blocked;
    }

    defender.damage += hit.damage;
    let impulse = knockback(hit.base_knockback, defender.damage, sim.knockback_scale, direction);
    defender.velocity.x += impulse;
    defender.hurt = true;
    animation::play(defender, AnimationId::Hurt, 0);
    timeline.schedule(sim.hurt_duration(), defender.side, defender.generation, Effect::ClearHurt);

    HitOutcome::Landed {
        damage: hit.damage,
        knockback: impulse,
    }
}

/// Record a hit outcome as an event.
pub(crate) fn hit_event(
    tick: u32,
    attacker: Side,
    defender: &Fighter,
    source: HitSource,
    outcome: HitOutcome,
) -> GameEvent {
    match outcome {
        HitOutcome::Blocked => {
            debug!(?attacker, defender = ?defender.side, ?source, "Strike blocked");
            GameEvent::strike_blocked(tick, attacker, defender.side, source)
        }
        HitOutcome::Landed { damage, knockback } => {
            debug!(
                ?attacker,
                defender = ?defender.side,
                ?source,
                damage,
                total = defender.damage,
                knockback,
                "Strike landed"
            );
            GameEvent::strike_landed(tick, attacker, defender.side, source, damage, defender.damage, knockback)
        }
    }
}

// =============================================================================
// DEFERRED EFFECTS
// =============================================================================

/// Apply one due effect, dropping it if its target has been replaced.
pub fn apply_effect(state: &mut MatchState, entry: Scheduled<Side, Effect>) {
    let side = entry.target;
    let current = state.fighter(side).generation;
    if current != entry.generation {
        trace!(
            ?side,
            scheduled = entry.generation,
            current,
            effect = ?entry.effect,
            "Dropping stale effect"
        );
        return;
    }

    if entry.effect.holds_attack_lock() {
        let fighter = state.fighter_mut(side);
        fighter.pending_phases = fighter.pending_phases.saturating_sub(1);
    }

    match entry.effect {
        Effect::ResolveStrike { hit, follow_through } => resolve_strike(state, side, hit, follow_through),
        Effect::FireProjectile { projectile } => fire_projectile(state, side, &projectile),
        Effect::BeginStrikePhase { strike_frame, strike_delay, hit } => {
            begin_strike_phase(state, side, strike_frame, strike_delay, hit);
        }
        Effect::EndSprint => {
            let fighter = state.fighter_mut(side);
            if fighter.velocity.x != 0.0 {
                fighter.velocity.x = fighter.velocity.x.signum();
            }
            fighter.max_speed = fighter.spec().max_speed;
            release_lock(fighter);
        }
        Effect::ClearHurt => state.fighter_mut(side).hurt = false,
        Effect::Respawn => {
            if state.fighter(side).is_knocked_out() {
                state.respawn(side);
            }
        }
    }
}

/// Drop the attack lock once no phase is left to run.
fn release_lock(fighter: &mut Fighter) {
    if fighter.pending_phases == 0 {
        fighter.attacking = None;
    }
}

/// Hit-test the attacker's range against the opponent.
///
/// A hurt attacker deals no damage, but the follow-through step still runs.
fn resolve_strike(state: &mut MatchState, side: Side, hit: HitSpec, follow_through: bool) {
    let tick = state.tick;
    let MatchState { fighters, timeline, sim, pending_events, .. } = state;
    let (attacker, defender) = Side::split_mut(fighters, side);

    if attacker.is_knocked_out() {
        return;
    }
    if attacker.hurt {
        debug!(?side, "Strike interrupted");
        release_lock(attacker);
        pending_events.push(GameEvent::attack_interrupted(tick, side));
    } else if defender.is_knocked_out() || !attacker.attack_range.overlaps(&defender.hitbox()) {
        pending_events.push(GameEvent::strike_missed(tick, side));
    } else {
        let outcome = apply_hit(defender, hit, attacker.direction, sim, timeline);
        pending_events.push(hit_event(tick, side, defender, HitSource::Melee, outcome));
    }

    if follow_through {
        let sign = attacker.direction.sign();
        attacker.push_horizontal(sign);
    }
}

/// Release a projectile from the attacker.
fn fire_projectile(state: &mut MatchState, side: Side, spec: &ProjectileSpec) {
    let tick = state.tick;
    let fighter = state.fighter_mut(side);

    if fighter.is_knocked_out() {
        return;
    }
    if fighter.hurt {
        debug!(?side, "Shot interrupted");
        release_lock(fighter);
        state.push_event(GameEvent::attack_interrupted(tick, side));
        return;
    }

    let projectile = Projectile::spawn(fighter, spec);
    debug!(?side, x = projectile.position.x, y = projectile.position.y, "Projectile fired");
    fighter.projectiles.push(projectile);
    state.push_event(GameEvent::projectile_fired(tick, side));
}

/// Dash window over: retag as the first ability and queue the strike.
fn begin_strike_phase(
    state: &mut MatchState,
    side: Side,
    strike_frame: u8,
    strike_delay: Duration,
    hit: HitSpec,
) {
    let MatchState { fighters, timeline, .. } = state;
    let fighter = &mut fighters[side.index()];

    fighter.max_speed = fighter.spec().max_speed;
    if fighter.is_knocked_out() {
        return;
    }

    // Runs even while hurt; only the strike itself checks for interruption
    fighter.attacking = Some(AbilitySlot::Ability1);
    animation::play(fighter, AnimationId::Ability1, strike_frame);
    timeline.schedule_phase(fighter, strike_delay, Effect::ResolveStrike { hit, follow_through: true });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::events::GameEventData;
    use crate::game::variant::VariantKind;

    fn fighter(variant: VariantKind) -> Fighter {
        let mut f = Fighter::new(Side::Cpu, variant, 1, Vec2::new(400.0, 520.0), Facing::Left, 3, 999.0);
        f.grounded = true;
        f
    }

    #[test]
    fn test_knockback_formula() {
        assert_eq!(knockback(2.0, 0.0, 0.2, Facing::Right), 2.0);
        assert_eq!(knockback(2.0, 80.0, 0.2, Facing::Right), 34.0);
        assert_eq!(knockback(5.0, 10.0, 0.2, Facing::Left), -15.0);
    }

    #[test]
    fn test_apply_hit_accumulates_then_scales() {
        let sim = SimConfig::default();
        let mut timeline = Timeline::new();
        let mut defender = fighter(VariantKind::Warrior);

        let outcome = apply_hit(&mut defender, HitSpec { damage: 80.0, base_knockback: 2.0 }, Facing::Right, &sim, &mut timeline);
        assert_eq!(outcome, HitOutcome::Landed { damage: 80.0, knockback: 34.0 });
        assert_eq!(defender.damage, 80.0);
        assert_eq!(defender.velocity.x, 34.0);
        assert!(defender.hurt);
        assert_eq!(defender.animation.id, AnimationId::Hurt);
        assert_eq!(timeline.pending_for(Side::Cpu, 1), 1);
    }

    #[test]
    fn test_shield_absorbs_hit() {
        let sim = SimConfig::default();
        let mut timeline = Timeline::new();
        let mut defender = fighter(VariantKind::Archer);
        defender.shield();

        let outcome = apply_hit(&mut defender, HitSpec { damage: 25.0, base_knockback: 5.0 }, Facing::Left, &sim, &mut timeline);
        assert_eq!(outcome, HitOutcome::Blocked);
        assert_eq!(defender.damage, 0.0);
        assert_eq!(defender.velocity.x, 0.0);
        assert!(!defender.hurt);
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_ability_lock_rejects_reentry() {
        let mut timeline = Timeline::new();
        let mut f = fighter(VariantKind::Warrior);

        assert!(f.ability1(&mut timeline));
        assert!(!f.ability1(&mut timeline));
        assert!(!f.ability2(&mut timeline));
        assert_eq!(timeline.pending(), 1);
        assert_eq!(f.pending_phases, 1);
        assert_eq!(f.attacking, Some(AbilitySlot::Ability1));
    }

    #[test]
    fn test_ability_rejected_while_hurt_or_shielding() {
        let mut timeline = Timeline::new();
        let mut f = fighter(VariantKind::Warrior);
        f.hurt = true;
        assert!(!f.ability1(&mut timeline));

        f.hurt = false;
        f.shield();
        assert!(!f.ability2(&mut timeline));
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_strike_plants_feet() {
        let mut timeline = Timeline::new();
        let mut f = fighter(VariantKind::Warrior);
        f.velocity.x = -7.0;
        assert!(f.ability1(&mut timeline));
        assert_eq!(f.velocity.x, 0.0);
        assert_eq!(f.animation.id, AnimationId::Ability1);
        assert_eq!(f.animation.frame_index, 0);
    }

    #[test]
    fn test_dash_raises_cap_and_pushes() {
        let mut timeline = Timeline::new();
        let mut f = fighter(VariantKind::Warrior);
        f.velocity.x = -4.0;
        assert!(f.ability2(&mut timeline));
        assert_eq!(f.max_speed, 20.0);
        assert_eq!(f.velocity.x, -7.0);
    }

    #[test]
    fn test_sprint_scales_cap() {
        let mut timeline = Timeline::new();
        let mut f = fighter(VariantKind::Archer);
        f.velocity.x = -10.0;
        assert!(f.ability2(&mut timeline));
        assert_eq!(f.max_speed, 22.5);
        assert_eq!(f.velocity.x, -15.0);
    }

    #[test]
    fn test_hurt_dash_still_enters_strike_phase() {
        let mut state = MatchState::with_variants(VariantKind::Warrior, VariantKind::Warrior);
        let hit = HitSpec { damage: 60.0, base_knockback: 2.0 };
        {
            let MatchState { fighters, timeline, .. } = &mut state;
            assert!(fighters[Side::Player.index()].ability2(timeline));
        }

        // Opponent inside the attack range
        let reach = state.fighter(Side::Player).position.x + 100.0;
        state.fighter_mut(Side::Cpu).position.x = reach;
        state.fighter_mut(Side::Player).hurt = true;

        let generation = state.fighter(Side::Player).generation;
        let due = |effect: Effect| Scheduled {
            fire_at: Duration::ZERO,
            seq: 0,
            generation,
            target: Side::Player,
            effect,
        };

        apply_effect(
            &mut state,
            due(Effect::BeginStrikePhase { strike_frame: 9, strike_delay: Duration::from_millis(150), hit }),
        );
        {
            let a = state.fighter(Side::Player);
            assert_eq!(a.attacking, Some(AbilitySlot::Ability1));
            assert_eq!(a.animation.id, AnimationId::Ability1);
            assert_eq!(a.animation.frame_index, 9);
            assert_eq!(a.max_speed, 10.0);
            assert_eq!(a.pending_phases, 1);
        }

        let vx = state.fighter(Side::Player).velocity.x;
        apply_effect(&mut state, due(Effect::ResolveStrike { hit, follow_through: true }));

        let a = state.fighter(Side::Player);
        assert_eq!(a.attacking, None);
        assert_eq!(a.pending_phases, 0);
        assert_eq!(a.velocity.x, vx + 1.0, "follow-through step still applied");
        assert_eq!(state.fighter(Side::Cpu).damage, 0.0);

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].data, GameEventData::AttackInterrupted { side: Side::Player }));
    }
}
