//! Projectiles
//!
//! Straight-line shots owned by the fighter that fired them. A projectile is
//! retired on contact with the opponent (hit or blocked) or once it leaves
//! the screen plus the configured slack. Retired projectiles are removed from
//! the owner's list at the end of the tick. A respawned owner starts with an
//! empty list, so in-flight shots of the old instance disappear with it.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::config::SimConfig;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::fighter::{Facing, Fighter};
use crate::game::state::Side;
use crate::game::variant::{HitSpec, ProjectileSpec};

/// A live projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Top-left corner
    pub position: Vec2,
    /// Collision size
    pub size: Vec2,
    /// Distance per tick
    pub speed: f32,
    /// Travel direction
    pub direction: Facing,
    /// Fighter that fired it
    pub owner: Side,
    /// Owner generation at spawn; a mismatch retires the shot unresolved
    pub generation: u32,
    /// Hit delivered on contact
    pub hit: HitSpec,
    /// Cleared on contact or when out of range
    pub live: bool,
}

impl Projectile {
    /// Spawn at the owner's leading position, vertically centred on the body.
    pub fn spawn(owner: &Fighter, spec: &ProjectileSpec) -> Self {
        let body = owner.spec().body;
        Self {
            position: Vec2::new(owner.position.x, owner.position.y + body.y / 2.0),
            size: spec.size,
            speed: spec.speed,
            direction: owner.direction,
            owner: owner.side,
            generation: owner.generation,
            hit: spec.hit,
            live: true,
        }
    }

    /// Collision rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    /// Move one tick; retires the projectile once it is out of range.
    pub fn advance(&mut self, sim: &SimConfig) {
        if !self.live {
            return;
        }

        self.position.x += self.speed * self.direction.sign();

        let range = sim.screen().expand(sim.projectile_slack);
        if !self.rect().overlaps(&range) {
            trace!(owner = ?self.owner, x = self.position.x, "Projectile out of range");
            self.live = false;
        }
    }

    /// Retire after contact.
    #[inline]
    pub fn retire(&mut self) {
        self.live = false;
    }
}
