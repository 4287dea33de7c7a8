//! Fighter
//!
//! The per-combatant state plus its control surface (`move_x`, `jump`,
//! `shield`, `ability1`, `ability2`, `update`). Physics, animation and combat
//! live in their own modules and operate on this struct.

use serde::{Serialize, Deserialize};

use crate::config::SimConfig;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::animation::{self, AnimationState};
use crate::game::combat::{self, Timeline};
use crate::game::physics;
use crate::game::projectile::Projectile;
use crate::game::state::Side;
use crate::game::variant::{AbilitySpec, AnimationId, VariantKind, VariantSpec};

/// How far knockback may carry `|vx|` past the speed cap.
pub const KNOCKBACK_OVERSHOOT: f32 = 5.0;

/// Movement steps a dash or sprint applies per tick.
pub const PROPULSION_STEPS: u32 = 4;

// =============================================================================
// FACING / ABILITY SLOT
// =============================================================================

/// Horizontal facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing -X
    Left,
    /// Facing +X
    Right,
}

impl Facing {
    /// -1.0 or +1.0.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing for a movement direction; `None` for 0.
    pub fn from_direction(direction: i8) -> Option<Self> {
        match direction.signum() {
            -1 => Some(Facing::Left),
            1 => Some(Facing::Right),
            _ => None,
        }
    }
}

/// Which ability holds the attack lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AbilitySlot {
    /// First ability (also the strike phase of a dash-strike)
    Ability1 = 0,
    /// Second ability
    Ability2 = 1,
}

impl AbilitySlot {
    /// Animation bound to this slot.
    pub fn animation(self) -> AnimationId {
        match self {
            AbilitySlot::Ability1 => AnimationId::Ability1,
            AbilitySlot::Ability2 => AnimationId::Ability2,
        }
    }
}

// =============================================================================
// FIGHTER
// =============================================================================

/// State of one combatant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fighter {
    /// Seat in the match
    pub side: Side,

    /// Character variant (selects the capability descriptor)
    pub variant: VariantKind,

    /// Instance generation; deferred effects from older generations are dropped
    pub generation: u32,

    /// Top-left corner of the body
    pub position: Vec2,

    /// Per-tick velocity
    pub velocity: Vec2,

    /// Facing (flips the sprite and the attack range)
    pub direction: Facing,

    /// Resting exactly on the floor after the last integration
    pub grounded: bool,

    /// Air jump still available
    pub has_double_jump: bool,

    /// Accumulated damage (only reset by respawn)
    pub damage: f32,

    /// Remaining lives, including the current one
    pub lives: u32,

    /// Damage at which this fighter is knocked out
    pub ko_damage: f32,

    /// Attack lock
    pub attacking: Option<AbilitySlot>,

    /// Reacting to a hit (movement and new attacks rejected)
    pub hurt: bool,

    /// Shield raised this tick
    pub shielding: bool,

    /// Still inside the kill bounds
    pub alive: bool,

    /// Current horizontal speed cap (dash and sprint raise it temporarily)
    pub max_speed: f32,

    /// Forward damage rectangle, re-anchored every tick
    pub attack_range: Rect,

    /// Selected animation and frame
    pub animation: AnimationState,

    /// Monotonic update counter used for animation stagger
    pub tick_counter: u64,

    /// Own ability continuations still queued on the timeline
    pub pending_phases: u32,

    /// Movement input or self-propulsion was applied this tick
    pub propelled: bool,

    /// KO already handled by the round rules
    pub ko_handled: bool,

    /// Live projectiles fired by this fighter
    pub projectiles: Vec<Projectile>,
}

impl Fighter {
    /// Create a fighter at `position`.
    pub fn new(
        side: Side,
        variant: VariantKind,
        generation: u32,
        position: Vec2,
        direction: Facing,
        lives: u32,
        ko_damage: f32,
    ) -> Self {
        let spec = variant.spec();
        let mut fighter = Self {
            side,
            variant,
            generation,
            position,
            velocity: Vec2::ZERO,
            direction,
            grounded: false,
            has_double_jump: true,
            damage: 0.0,
            lives,
            ko_damage,
            attacking: None,
            hurt: false,
            shielding: false,
            alive: true,
            max_speed: spec.max_speed,
            attack_range: Rect::default(),
            animation: AnimationState::new(spec.animations.idle),
            tick_counter: 0,
            pending_phases: 0,
            propelled: false,
            ko_handled: false,
            projectiles: Vec::new(),
        };
        fighter.anchor_attack_range();
        fighter
    }

    /// Capability descriptor.
    #[inline]
    pub fn spec(&self) -> &'static VariantSpec {
        self.variant.spec()
    }

    /// Body rectangle.
    #[inline]
    pub fn hitbox(&self) -> Rect {
        Rect::from_parts(self.position, self.spec().body)
    }

    /// Knocked out: left the kill bounds or took too much damage.
    #[inline]
    pub fn is_knocked_out(&self) -> bool {
        !self.alive || self.damage >= self.ko_damage
    }

    /// Health remaining before a damage KO.
    pub fn health(&self) -> f32 {
        (self.ko_damage - self.damage).max(0.0)
    }

    /// Ability descriptor for a slot.
    pub fn ability(&self, slot: AbilitySlot) -> &'static AbilitySpec {
        let spec = self.spec();
        match slot {
            AbilitySlot::Ability1 => &spec.ability1,
            AbilitySlot::Ability2 => &spec.ability2,
        }
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Horizontal movement input: -1, 0 or +1.
    ///
    /// Rejected while hurt, attacking, shielding or knocked out.
    pub fn move_x(&mut self, direction: i8) {
        if self.hurt || self.attacking.is_some() || self.shielding || self.is_knocked_out() {
            return;
        }

        if let Some(facing) = Facing::from_direction(direction) {
            self.direction = facing;
            self.propelled = true;
        }
        self.push_horizontal(direction.signum() as f32);
    }

    /// Jump, or double jump while airborne.
    pub fn jump(&mut self) {
        if self.is_knocked_out() || self.shielding || self.attacking.is_some() {
            return;
        }
        if !self.grounded && !self.has_double_jump {
            return;
        }
        if !self.grounded {
            self.has_double_jump = false;
        }
        self.velocity.y = -self.spec().jump_force;
    }

    /// Raise the shield for this tick. Only on the floor and not attacking.
    pub fn shield(&mut self) {
        if !self.grounded || self.attacking.is_some() || self.is_knocked_out() {
            return;
        }
        self.velocity.x = 0.0;
        self.shielding = true;
    }

    /// Lower the shield.
    pub fn release_shield(&mut self) {
        self.shielding = false;
    }

    /// Start the first ability. Returns whether it was accepted.
    pub fn ability1(&mut self, timeline: &mut Timeline) -> bool {
        combat::begin_ability(self, AbilitySlot::Ability1, timeline)
    }

    /// Start the second ability. Returns whether it was accepted.
    pub fn ability2(&mut self, timeline: &mut Timeline) -> bool {
        combat::begin_ability(self, AbilitySlot::Ability2, timeline)
    }

    /// Advance one tick: self-propulsion, physics, animation, attack range.
    ///
    /// A knocked-out fighter only advances its (frozen) death animation.
    pub fn update(&mut self, sim: &SimConfig) {
        self.tick_counter += 1;

        if self.is_knocked_out() {
            self.velocity = Vec2::ZERO;
            self.propelled = false;
            animation::animate(self);
            return;
        }

        self.self_propel();
        physics::integrate(self, sim);
        animation::animate(self);
        self.anchor_attack_range();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Add one movement step in `sign` direction, respecting the speed cap.
    ///
    /// Knockback overshoot beyond the cap can only be reduced here.
    pub(crate) fn push_horizontal(&mut self, sign: f32) {
        let before = self.velocity.x;
        let mut vx = before + sign * self.spec().move_accel;

        if before.abs() > self.max_speed {
            if vx.abs() > before.abs() {
                vx = before;
            }
        } else {
            vx = vx.clamp(-self.max_speed, self.max_speed);
        }

        self.velocity.x = vx;
    }

    /// Dash/sprint propulsion while a self-propelled ability holds the lock.
    fn self_propel(&mut self) {
        let Some(slot) = self.attacking else {
            return;
        };
        if !self.ability(slot).self_propelled() {
            return;
        }

        let sign = self.direction.sign();
        for _ in 0..PROPULSION_STEPS {
            if self.velocity.x.abs() < self.max_speed {
                self.push_horizontal(sign);
            }
        }
        self.velocity.x = self.velocity.x.clamp(-self.max_speed, self.max_speed);
        self.propelled = true;
    }

    /// Place the attack range against the leading edge of the body.
    pub(crate) fn anchor_attack_range(&mut self) {
        let spec = self.spec();
        let width = spec.attack_range_width;
        let x = match self.direction {
            Facing::Right => self.position.x + spec.body.x,
            Facing::Left => self.position.x - width,
        };
        self.attack_range = Rect::new(x, self.position.y, width, spec.body.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_fighter(variant: VariantKind) -> (Fighter, SimConfig) {
        let sim = SimConfig::default();
        let body = variant.spec().body;
        let mut fighter = Fighter::new(
            Side::Player,
            variant,
            1,
            Vec2::new(400.0, sim.floor_y - body.y),
            Facing::Right,
            3,
            999.0,
        );
        fighter.update(&sim);
        assert!(fighter.grounded);
        (fighter, sim)
    }

    #[test]
    fn test_move_x_accelerates_and_caps() {
        let (mut f, _) = grounded_fighter(VariantKind::Warrior);
        for _ in 0..50 {
            f.move_x(1);
        }
        assert_eq!(f.velocity.x, f.max_speed);
        assert_eq!(f.direction, Facing::Right);

        f.move_x(-1);
        assert_eq!(f.direction, Facing::Left);
        assert_eq!(f.velocity.x, f.max_speed - 1.0);
    }

    #[test]
    fn test_move_x_rejected_while_hurt() {
        let (mut f, _) = grounded_fighter(VariantKind::Warrior);
        f.hurt = true;
        f.move_x(-1);
        assert_eq!(f.velocity.x, 0.0);
        assert_eq!(f.direction, Facing::Right);
    }

    #[test]
    fn test_movement_only_bleeds_knockback() {
        let (mut f, _) = grounded_fighter(VariantKind::Warrior);
        f.velocity.x = f.max_speed + 4.0;

        // Pushing along the overshoot does not grow it
        f.move_x(1);
        assert_eq!(f.velocity.x, f.max_speed + 4.0);

        // Pushing against it reduces it by one step, not to the cap
        f.move_x(-1);
        assert_eq!(f.velocity.x, f.max_speed + 3.0);
    }

    #[test]
    fn test_jump_and_double_jump() {
        let (mut f, sim) = grounded_fighter(VariantKind::Archer);
        f.jump();
        assert_eq!(f.velocity.y, -f.spec().jump_force);
        f.update(&sim);
        assert!(!f.grounded);
        assert!(f.has_double_jump);

        f.jump();
        assert!(!f.has_double_jump);

        let vy = f.velocity.y;
        f.update(&sim);
        f.jump();
        // Third jump rejected: only gravity changed vy
        assert_eq!(f.velocity.y, vy + sim.gravity);
    }

    #[test]
    fn test_shield_requires_ground_and_zeroes_vx() {
        let (mut f, sim) = grounded_fighter(VariantKind::Warrior);
        f.velocity.x = 6.0;
        f.shield();
        assert!(f.shielding);
        assert_eq!(f.velocity.x, 0.0);

        f.release_shield();
        f.jump();
        f.update(&sim);
        f.shield();
        assert!(!f.shielding);
    }

    #[test]
    fn test_jump_rejected_while_shielding() {
        let (mut f, _) = grounded_fighter(VariantKind::Warrior);
        f.shield();
        f.jump();
        assert_eq!(f.velocity.y, 0.0);
    }

    #[test]
    fn test_attack_range_follows_facing() {
        let (mut f, sim) = grounded_fighter(VariantKind::Warrior);
        assert_eq!(f.attack_range.x, f.position.x + 80.0);

        f.move_x(-1);
        f.update(&sim);
        assert_eq!(f.attack_range.x, f.position.x - 80.0);
        assert_eq!(f.attack_range.w, 80.0);
        assert_eq!(f.attack_range.y, f.position.y);
    }

    #[test]
    fn test_knocked_out_freezes() {
        let (mut f, sim) = grounded_fighter(VariantKind::Warrior);
        f.damage = f.ko_damage;
        f.velocity.x = 5.0;
        let position = f.position;
        f.update(&sim);
        assert!(f.is_knocked_out());
        assert_eq!(f.position, position);
        assert_eq!(f.animation.id, AnimationId::Death);
        assert_eq!(f.health(), 0.0);
    }
}
