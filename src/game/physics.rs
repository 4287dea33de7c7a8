//! Physics Integrator
//!
//! Per-tick kinematics for one fighter, applied in a fixed order:
//!
//! 1. Gravity (skipped while resting on the floor)
//! 2. Friction (skipped while propelled; overshoot past the cap always bleeds)
//! 3. Speed governor and shield lock
//! 4. Wall clamp
//! 5. Position integration
//! 6. Floor landing
//! 7. Grounded and liveness checks

use crate::config::SimConfig;
use crate::game::fighter::{Fighter, KNOCKBACK_OVERSHOOT};

/// Y at which a body of `height` rests on the floor.
#[inline]
pub fn rest_y(sim: &SimConfig, height: f32) -> f32 {
    sim.floor_y - height
}

/// Whether a body spanning `[x, x + width)` is above the floor segment.
#[inline]
pub fn over_floor(sim: &SimConfig, x: f32, width: f32) -> bool {
    x + width > sim.floor_left && x < sim.floor_right
}

/// Decay `vx` toward zero.
///
/// Unpropelled bodies lose `friction_step` per tick and snap to zero below
/// `friction_snap`. Propelled bodies only lose the part above `max_speed`.
pub fn apply_friction(vx: f32, propelled: bool, max_speed: f32, sim: &SimConfig) -> f32 {
    let magnitude = vx.abs();
    if magnitude == 0.0 {
        return 0.0;
    }

    if !propelled {
        let decayed = magnitude - sim.friction_step;
        if decayed < sim.friction_snap {
            0.0
        } else {
            decayed.copysign(vx)
        }
    } else if magnitude > max_speed {
        (magnitude - sim.friction_step).max(max_speed).copysign(vx)
    } else {
        vx
    }
}

/// Advance one fighter by one tick.
pub fn integrate(fighter: &mut Fighter, sim: &SimConfig) {
    let body = fighter.spec().body;
    let rest = rest_y(sim, body.y);

    // 1. Gravity
    let resting = over_floor(sim, fighter.position.x, body.x) && fighter.position.y == rest;
    if !resting {
        fighter.velocity.y += sim.gravity;
    }

    // 2. Friction
    fighter.velocity.x = apply_friction(
        fighter.velocity.x,
        fighter.propelled,
        fighter.max_speed,
        sim,
    );

    // 3. Governor
    let cap = fighter.max_speed + KNOCKBACK_OVERSHOOT;
    fighter.velocity.x = fighter.velocity.x.clamp(-cap, cap);
    if fighter.shielding {
        fighter.velocity.x = 0.0;
    }

    // 4. Walls
    let next_x = fighter.position.x + fighter.velocity.x;
    if next_x < sim.wall_left {
        fighter.position.x = sim.wall_left;
        fighter.velocity.x = 0.0;
    } else if next_x + body.x > sim.wall_right {
        fighter.position.x = sim.wall_right - body.x;
        fighter.velocity.x = 0.0;
    } else {
        fighter.position.x = next_x;
    }

    // 5. Integrate
    fighter.position.y += fighter.velocity.y;

    // 6. Landing: falling while the body top is still above the floor line
    let above_floor = over_floor(sim, fighter.position.x, body.x);
    if above_floor
        && fighter.velocity.y > 0.0
        && fighter.position.y >= rest
        && fighter.position.y < sim.floor_y
    {
        fighter.position.y = rest;
        fighter.velocity.y = 0.0;
        fighter.has_double_jump = true;
    }

    // 7. Grounded and liveness
    fighter.grounded = above_floor && fighter.position.y == rest;
    if !sim.kill_bounds().contains_rect(&fighter.hitbox()) {
        fighter.alive = false;
    }

    fighter.propelled = false;
}
