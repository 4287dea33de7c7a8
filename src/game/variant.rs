//! Fighter Variants
//!
//! Each playable character is one `VariantSpec`: a capability descriptor
//! holding body size, movement limits, sprite-sheet layout, the animation
//! table and the two ability definitions. Fighters never subclass; they carry
//! a `VariantKind` and look their descriptor up.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

// =============================================================================
// ANIMATION TABLE
// =============================================================================

/// Logical animation selected by the animation state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimationId {
    /// Standing still on the floor
    Idle = 0,
    /// Moving on the floor
    Run = 1,
    /// Airborne, moving up
    Rise = 2,
    /// Airborne, moving down
    Fall = 3,
    /// First ability (or the strike phase of a dash-strike)
    Ability1 = 4,
    /// Second ability
    Ability2 = 5,
    /// Hit reaction
    Hurt = 6,
    /// Knocked out
    Death = 7,
}

/// One row of a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    /// Sprite-sheet row (0-based)
    pub row: u8,
    /// Number of frames in the row (at least 1)
    pub frames: u8,
    /// Row is drawn facing the opposite way to the fighter
    pub mirrored: bool,
}

impl Clip {
    /// Clip drawn in the fighter's facing.
    pub const fn new(row: u8, frames: u8) -> Self {
        Self { row, frames, mirrored: false }
    }

    /// Clip whose artwork faces the other way.
    pub const fn mirrored(row: u8, frames: u8) -> Self {
        Self { row, frames, mirrored: true }
    }

    /// Highest valid frame index.
    #[inline]
    pub fn max_frame(&self) -> u8 {
        self.frames.saturating_sub(1)
    }
}

/// Maps every `AnimationId` to a sprite-sheet clip.
#[derive(Clone, Copy, Debug)]
pub struct AnimationTable {
    /// Standing still
    pub idle: Clip,
    /// Running on the floor
    pub run: Clip,
    /// Airborne, moving up
    pub rise: Clip,
    /// Airborne, moving down
    pub fall: Clip,
    /// First ability
    pub ability1: Clip,
    /// Second ability
    pub ability2: Clip,
    /// Hit reaction
    pub hurt: Clip,
    /// Knocked out (last frame is held)
    pub death: Clip,
}

impl AnimationTable {
    /// Look up the clip for an animation.
    pub fn clip(&self, id: AnimationId) -> Clip {
        match id {
            AnimationId::Idle => self.idle,
            AnimationId::Run => self.run,
            AnimationId::Rise => self.rise,
            AnimationId::Fall => self.fall,
            AnimationId::Ability1 => self.ability1,
            AnimationId::Ability2 => self.ability2,
            AnimationId::Hurt => self.hurt,
            AnimationId::Death => self.death,
        }
    }
}

/// Sprite-sheet layout and draw constants consumed by the renderer.
#[derive(Clone, Copy, Debug)]
pub struct SpriteSheet {
    /// Asset path, relative to the fighter asset directory
    pub path: &'static str,
    /// Width of one frame in the sheet
    pub frame_width: f32,
    /// Height of one frame in the sheet
    pub frame_height: f32,
    /// On-screen scale of a frame
    pub scale: f32,
    /// Offset of the sprite relative to the body (x subtracted, y added)
    pub draw_offset: Vec2,
    /// Offset of the shield overlay relative to the body (subtracted)
    pub shield_offset: Vec2,
}

// =============================================================================
// ABILITIES
// =============================================================================

/// Damage and knockback delivered by one hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitSpec {
    /// Damage added to the defender
    pub damage: f32,
    /// Knockback before damage scaling
    pub base_knockback: f32,
}

/// Projectile fired by a `Shot` ability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Distance travelled per tick
    pub speed: f32,
    /// Collision size
    pub size: Vec2,
    /// Hit delivered on contact
    pub hit: HitSpec,
}

/// What an ability does once accepted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilitySpec {
    /// Plant feet, wind up, then hit-test the attack range.
    Strike {
        /// Delay before the hit test
        windup: Duration,
        /// Hit delivered on contact
        hit: HitSpec,
    },
    /// Dash forward, switch to the strike tag, then hit-test.
    DashStrike {
        /// Speed cap during the dash
        dash_speed: f32,
        /// Length of the dash before the strike phase
        dash_window: Duration,
        /// Frame of the strike clip the second phase starts on
        strike_frame: u8,
        /// Delay between the strike phase and the hit test
        strike_delay: Duration,
        /// Hit delivered on contact
        hit: HitSpec,
    },
    /// Plant feet, wind up, then fire a projectile.
    Shot {
        /// Delay before the projectile is released
        windup: Duration,
        /// Projectile released
        projectile: ProjectileSpec,
    },
    /// Raise the speed cap and run for a while.
    Sprint {
        /// Multiplier applied to the speed cap and current `vx`
        speed_scale: f32,
        /// How long the raised cap lasts
        duration: Duration,
    },
}

impl AbilitySpec {
    /// Whether the fighter self-propels while this ability holds the lock.
    pub fn self_propelled(&self) -> bool {
        matches!(self, AbilitySpec::DashStrike { .. } | AbilitySpec::Sprint { .. })
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

/// Playable character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VariantKind {
    /// Melee fighter: heavy strike and dash-strike
    Warrior = 0,
    /// Ranged fighter: arrow shot and sprint
    Archer = 1,
}

impl VariantKind {
    /// Capability descriptor for this variant.
    pub fn spec(self) -> &'static VariantSpec {
        match self {
            VariantKind::Warrior => &WARRIOR,
            VariantKind::Archer => &ARCHER,
        }
    }
}

/// Capability descriptor for one fighter variant.
#[derive(Clone, Copy, Debug)]
pub struct VariantSpec {
    /// Display name
    pub name: &'static str,
    /// Body size
    pub body: Vec2,
    /// Width of the forward attack range (height matches the body)
    pub attack_range_width: f32,
    /// Horizontal speed cap
    pub max_speed: f32,
    /// Upward impulse applied by a jump
    pub jump_force: f32,
    /// Velocity added per movement step
    pub move_accel: f32,
    /// Ticks between animation frame advances
    pub stagger: u32,
    /// Render constants
    pub sprite: SpriteSheet,
    /// Animation rows
    pub animations: AnimationTable,
    /// First ability
    pub ability1: AbilitySpec,
    /// Second ability
    pub ability2: AbilitySpec,
}

/// Heavy melee fighter.
pub static WARRIOR: VariantSpec = VariantSpec {
    name: "Warrior",
    body: Vec2::new(80.0, 80.0),
    attack_range_width: 80.0,
    max_speed: 10.0,
    jump_force: 10.0,
    move_accel: 1.0,
    stagger: 5,
    sprite: SpriteSheet {
        path: "warrior/sheet.png",
        frame_width: 80.0,
        frame_height: 80.0,
        scale: 2.0,
        draw_offset: Vec2::new(40.0, -57.0),
        shield_offset: Vec2::new(0.0, -5.0),
    },
    // The sheet has no jump rows; airborne frames reuse the run row.
    animations: AnimationTable {
        idle: Clip::new(0, 9),
        run: Clip::new(1, 6),
        rise: Clip::new(1, 6),
        fall: Clip::new(1, 6),
        ability1: Clip::new(2, 12),
        ability2: Clip::new(2, 7),
        hurt: Clip::new(3, 5),
        death: Clip::new(3, 5),
    },
    ability1: AbilitySpec::Strike {
        windup: Duration::from_millis(1500),
        hit: HitSpec { damage: 80.0, base_knockback: 2.0 },
    },
    ability2: AbilitySpec::DashStrike {
        dash_speed: 20.0,
        dash_window: Duration::from_millis(500),
        strike_frame: 9,
        strike_delay: Duration::from_millis(150),
        hit: HitSpec { damage: 60.0, base_knockback: 2.0 },
    },
};

/// Ranged fighter.
pub static ARCHER: VariantSpec = VariantSpec {
    name: "Archer",
    body: Vec2::new(80.0, 80.0),
    attack_range_width: 20.0,
    max_speed: 15.0,
    jump_force: 15.0,
    move_accel: 1.0,
    stagger: 5,
    sprite: SpriteSheet {
        path: "purple_arrow/sheet.png",
        frame_width: 64.0,
        frame_height: 64.0,
        scale: 1.5,
        draw_offset: Vec2::new(20.0, -5.0),
        shield_offset: Vec2::new(5.0, -5.0),
    },
    animations: AnimationTable {
        idle: Clip::new(5, 4),
        run: Clip::new(0, 8),
        rise: Clip::new(6, 4),
        fall: Clip::mirrored(4, 2),
        ability1: Clip::new(3, 7),
        ability2: Clip::new(2, 7),
        hurt: Clip::new(7, 2),
        death: Clip::new(7, 2),
    },
    ability1: AbilitySpec::Shot {
        windup: Duration::from_millis(900),
        projectile: ProjectileSpec {
            speed: 60.0,
            size: Vec2::new(32.0, 8.0),
            hit: HitSpec { damage: 25.0, base_knockback: 5.0 },
        },
    },
    ability2: AbilitySpec::Sprint {
        speed_scale: 1.5,
        duration: Duration::from_millis(1000),
    },
};
