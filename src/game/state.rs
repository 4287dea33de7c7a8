//! Match State
//!
//! The session context: both fighters, the timeline of deferred effects,
//! configuration and round bookkeeping. Fighters never reference each other;
//! everything that needs both goes through `MatchState`.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::config::{MatchConfig, SimConfig};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::vec2::Vec2;
use crate::game::combat::Timeline;
use crate::game::events::GameEvent;
use crate::game::fighter::{Facing, Fighter};
use crate::game::physics;
use crate::game::variant::VariantKind;

// =============================================================================
// SIDE
// =============================================================================

/// Seat in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Local player
    Player = 0,
    /// Opponent
    Cpu = 1,
}

impl Side {
    /// Both sides, in update order.
    pub const ALL: [Side; 2] = [Side::Player, Side::Cpu];

    /// Index into per-side arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The other side.
    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Cpu,
            Side::Cpu => Side::Player,
        }
    }

    /// Borrow `side`'s fighter and its opponent mutably at once.
    pub fn split_mut(fighters: &mut [Fighter; 2], side: Side) -> (&mut Fighter, &mut Fighter) {
        let [player, cpu] = fighters;
        match side {
            Side::Player => (player, cpu),
            Side::Cpu => (cpu, player),
        }
    }
}

// =============================================================================
// SETUP / PHASE
// =============================================================================

/// Where and as what a fighter enters the arena.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterSetup {
    /// Character variant
    pub variant: VariantKind,
    /// Spawn position (top-left of the body)
    pub spawn: Vec2,
    /// Initial facing
    pub direction: Facing,
}

impl FighterSetup {
    /// Setup resting on the floor at `x`.
    pub fn on_floor(variant: VariantKind, x: f32, direction: Facing, sim: &SimConfig) -> Self {
        let height = variant.spec().body.y;
        Self {
            variant,
            spawn: Vec2::new(x, physics::rest_y(sim, height)),
            direction,
        }
    }

    /// Standard opening positions: a third of the floor in from each end,
    /// facing each other.
    pub fn default_pair(player: VariantKind, cpu: VariantKind, sim: &SimConfig) -> [FighterSetup; 2] {
        let third = (sim.floor_right - sim.floor_left) / 3.0;
        let cpu_width = cpu.spec().body.x;
        [
            Self::on_floor(player, sim.floor_left + third, Facing::Right, sim),
            Self::on_floor(cpu, sim.floor_right - third - cpu_width, Facing::Left, sim),
        ]
    }
}

/// Match phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Simulation running
    Playing,
    /// Match over; `None` means both fighters went down on their last life
    Ended {
        /// Winning side
        winner: Option<Side>,
    },
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Arena and physics constants
    pub sim: SimConfig,

    /// Round rules
    pub rules: MatchConfig,

    /// Ticks simulated so far
    pub tick: u32,

    /// Current match phase
    pub phase: MatchPhase,

    /// Both fighters, indexed by `Side::index`
    pub fighters: [Fighter; 2],

    /// Spawn setups, reused by respawn and rematch
    pub setups: [FighterSetup; 2],

    /// Clock and deferred effects
    #[serde(skip)]
    pub timeline: Timeline,

    /// Next generation handed out to a fresh fighter
    next_generation: u32,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a match with both fighters at their spawns.
    pub fn new(sim: SimConfig, rules: MatchConfig, setups: [FighterSetup; 2]) -> Self {
        let lives = rules.lives;
        let ko_damage = rules.ko_damage;
        let fighters = [
            Self::spawn_fighter(Side::Player, &setups[0], 1, lives, ko_damage),
            Self::spawn_fighter(Side::Cpu, &setups[1], 2, lives, ko_damage),
        ];

        Self {
            sim,
            rules,
            tick: 0,
            phase: MatchPhase::Playing,
            fighters,
            setups,
            timeline: Timeline::new(),
            next_generation: 3,
            pending_events: Vec::new(),
        }
    }

    /// Match with default configuration and opening positions.
    pub fn with_variants(player: VariantKind, cpu: VariantKind) -> Self {
        let sim = SimConfig::default();
        let setups = FighterSetup::default_pair(player, cpu, &sim);
        Self::new(sim, MatchConfig::default(), setups)
    }

    fn spawn_fighter(side: Side, setup: &FighterSetup, generation: u32, lives: u32, ko_damage: f32) -> Fighter {
        Fighter::new(side, setup.variant, generation, setup.spawn, setup.direction, lives, ko_damage)
    }

    fn take_generation(&mut self) -> u32 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }

    /// Fighter on `side`.
    #[inline]
    pub fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    /// Fighter on `side`, mutably.
    #[inline]
    pub fn fighter_mut(&mut self, side: Side) -> &mut Fighter {
        &mut self.fighters[side.index()]
    }

    /// Opponent of `side`.
    #[inline]
    pub fn opponent(&self, side: Side) -> &Fighter {
        self.fighter(side.other())
    }

    /// Replace `side`'s fighter with a fresh instance at its spawn, one life
    /// down. Pending effects and projectiles of the old instance are orphaned.
    pub fn respawn(&mut self, side: Side) {
        let generation = self.take_generation();
        let lives = self.fighter(side).lives.saturating_sub(1).max(1);
        let setup = self.setups[side.index()];
        self.fighters[side.index()] =
            Self::spawn_fighter(side, &setup, generation, lives, self.rules.ko_damage);

        info!(?side, generation, lives, "Fighter respawned");
        self.push_event(GameEvent::respawned(self.tick, side, lives));
    }

    /// Reset both fighters with full lives and resume play.
    pub fn rematch(&mut self) {
        for side in Side::ALL {
            let generation = self.take_generation();
            let setup = self.setups[side.index()];
            self.fighters[side.index()] =
                Self::spawn_fighter(side, &setup, generation, self.rules.lives, self.rules.ko_damage);
        }
        self.phase = MatchPhase::Playing;
        info!(tick = self.tick, "Rematch");
    }

    /// Check if match has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended { .. })
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            for fighter in &self.fighters {
                hasher.update_u8(fighter.side as u8);
                hasher.update_u8(fighter.variant as u8);
                hasher.update_u32(fighter.generation);
                hasher.update_vec2(fighter.position);
                hasher.update_vec2(fighter.velocity);
                hasher.update_f32(fighter.direction.sign());
                hasher.update_bool(fighter.grounded);
                hasher.update_bool(fighter.has_double_jump);
                hasher.update_f32(fighter.damage);
                hasher.update_u32(fighter.lives);
                hasher.update_u8(fighter.attacking.map_or(0xFF, |slot| slot as u8));
                hasher.update_bool(fighter.hurt);
                hasher.update_bool(fighter.shielding);
                hasher.update_bool(fighter.alive);
                hasher.update_f32(fighter.max_speed);
                hasher.update_u8(fighter.animation.id as u8);
                hasher.update_u8(fighter.animation.frame_index);
                hasher.update_u32(fighter.projectiles.len() as u32);
                for projectile in &fighter.projectiles {
                    hasher.update_vec2(projectile.position);
                    hasher.update_bool(projectile.live);
                }
            }

            match self.phase {
                MatchPhase::Playing => hasher.update_u8(0),
                MatchPhase::Ended { winner } => {
                    hasher.update_u8(1);
                    hasher.update_u8(winner.map_or(0xFF, |side| side as u8));
                }
            }
            hasher.update_u32(self.timeline.pending() as u32);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
