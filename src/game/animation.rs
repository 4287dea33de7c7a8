//! Animation Selector
//!
//! Picks the logical animation from fighter state, advances frames on the
//! variant's stagger, and resolves the render pose.
//!
//! Priority: Death > Hurt > Ability > Rise/Fall > Run > Idle.
//! Completing a Hurt cycle clears `hurt`; completing an ability cycle releases
//! the attack lock once no continuation is pending. Death holds its last frame.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::game::fighter::{Facing, Fighter};
use crate::game::variant::{AnimationId, Clip};

/// Current animation and frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Selected animation
    pub id: AnimationId,
    /// Frame within the clip, always `<= max_frame`
    pub frame_index: u8,
    /// Last frame of the selected clip
    pub max_frame: u8,
}

impl AnimationState {
    /// Idle at frame 0.
    pub fn new(idle: Clip) -> Self {
        Self {
            id: AnimationId::Idle,
            frame_index: 0,
            max_frame: idle.max_frame(),
        }
    }
}

/// Animation the fighter's state calls for.
pub fn select(fighter: &Fighter) -> AnimationId {
    if fighter.is_knocked_out() {
        AnimationId::Death
    } else if fighter.hurt {
        AnimationId::Hurt
    } else if let Some(slot) = fighter.attacking {
        slot.animation()
    } else if !fighter.grounded {
        if fighter.velocity.y <= 0.0 {
            AnimationId::Rise
        } else {
            AnimationId::Fall
        }
    } else if fighter.velocity.x != 0.0 {
        AnimationId::Run
    } else {
        AnimationId::Idle
    }
}

/// Switch to `id` at `frame`, clamped into the clip.
pub fn play(fighter: &mut Fighter, id: AnimationId, frame: u8) {
    let clip = fighter.spec().animations.clip(id);
    fighter.animation = AnimationState {
        id,
        frame_index: frame.min(clip.max_frame()),
        max_frame: clip.max_frame(),
    };
}

/// Select the animation for this tick and advance its frame.
pub fn animate(fighter: &mut Fighter) {
    let id = select(fighter);
    if id != fighter.animation.id {
        let frame = if id == AnimationId::Death {
            0
        } else if fighter.animation.frame_index > fighter.spec().animations.clip(id).max_frame() {
            0
        } else {
            fighter.animation.frame_index
        };
        play(fighter, id, frame);
    }

    let stagger = u64::from(fighter.spec().stagger.max(1));
    if fighter.tick_counter % stagger != 0 {
        return;
    }

    let state = &mut fighter.animation;
    if state.frame_index < state.max_frame {
        state.frame_index += 1;
    } else if state.id != AnimationId::Death {
        state.frame_index = 0;
        on_cycle_complete(fighter, id);
    }
}

fn on_cycle_complete(fighter: &mut Fighter, id: AnimationId) {
    match id {
        AnimationId::Hurt => fighter.hurt = false,
        AnimationId::Ability1 | AnimationId::Ability2 => {
            if fighter.pending_phases == 0 {
                fighter.attacking = None;
            }
        }
        _ => {}
    }
}

// =============================================================================
// POSE
// =============================================================================

/// Everything a renderer needs to draw one fighter this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Selected animation
    pub animation: AnimationId,
    /// Frame within the clip
    pub frame_index: u8,
    /// Region of the sprite sheet
    pub source: Rect,
    /// Region of the screen
    pub dest: Rect,
    /// Draw mirrored horizontally
    pub flip_x: bool,
    /// Shield overlay, if raised
    pub shield: Option<Rect>,
}

impl Fighter {
    /// Resolve the render pose from the current animation state.
    pub fn pose(&self) -> Pose {
        let spec = self.spec();
        let sheet = &spec.sprite;
        let clip = spec.animations.clip(self.animation.id);

        let source = Rect::new(
            f32::from(self.animation.frame_index) * sheet.frame_width,
            f32::from(clip.row) * sheet.frame_height,
            sheet.frame_width,
            sheet.frame_height,
        );

        let width = sheet.frame_width * sheet.scale;
        let height = sheet.frame_height * sheet.scale;
        let flip_x = (self.direction == Facing::Left) != clip.mirrored;
        let x = if flip_x {
            self.position.x + sheet.frame_width + sheet.draw_offset.x - width
        } else {
            self.position.x - sheet.draw_offset.x
        };
        let dest = Rect::new(x, self.position.y + sheet.draw_offset.y, width, height);

        let shield = self.shielding.then(|| {
            Rect::new(
                self.position.x - sheet.shield_offset.x,
                self.position.y - sheet.shield_offset.y,
                spec.body.x,
                spec.body.y,
            )
        });

        Pose {
            animation: self.animation.id,
            frame_index: self.animation.frame_index,
            source,
            dest,
            flip_x,
            shield,
        }
    }
}
