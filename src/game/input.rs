//! Input Frames
//!
//! One `InputFrame` per fighter per tick. Movement and shield are held
//! (level-triggered); jump and abilities are presses (edge-triggered).
//! `InputLatch` turns raw held-key snapshots into frames by diffing against
//! the previous snapshot.

use serde::{Serialize, Deserialize};

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input for one fighter for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Horizontal direction: -1 (left), 0, +1 (right)
    pub move_x: i8,

    /// Action flags (packed bits):
    /// - Bit 0: Jump pressed this frame
    /// - Bit 1: Shield held
    /// - Bit 2: Ability 1 pressed this frame
    /// - Bit 3: Ability 2 pressed this frame
    pub flags: u8,
}

impl InputFrame {
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x01;

    /// Shield flag bit
    pub const FLAG_SHIELD: u8 = 0x02;

    /// Ability 1 flag bit
    pub const FLAG_ABILITY_1: u8 = 0x04;

    /// Ability 2 flag bit
    pub const FLAG_ABILITY_2: u8 = 0x08;

    /// Empty frame.
    pub const fn new() -> Self {
        Self { move_x: 0, flags: 0 }
    }

    /// Frame holding a movement direction (clamped to -1..=1).
    pub const fn with_movement(move_x: i8) -> Self {
        Self {
            move_x: if move_x > 0 { 1 } else if move_x < 0 { -1 } else { 0 },
            flags: 0,
        }
    }

    /// Builder: add flag bits.
    pub const fn with_flags(mut self, flags: u8) -> Self {
        self.flags |= flags;
        self
    }

    /// Normalized movement direction.
    #[inline]
    pub fn move_direction(&self) -> i8 {
        self.move_x.signum()
    }

    /// Check if jump was pressed this frame.
    #[inline]
    pub fn jump_pressed(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Check if shield is held.
    #[inline]
    pub fn shield_held(&self) -> bool {
        self.flags & Self::FLAG_SHIELD != 0
    }

    /// Check if ability 1 was pressed this frame.
    #[inline]
    pub fn ability1_pressed(&self) -> bool {
        self.flags & Self::FLAG_ABILITY_1 != 0
    }

    /// Check if ability 2 was pressed this frame.
    #[inline]
    pub fn ability2_pressed(&self) -> bool {
        self.flags & Self::FLAG_ABILITY_2 != 0
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.move_x == 0 && self.flags == 0
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Set jump flag.
    #[inline]
    pub fn set_jump(&mut self, pressed: bool) {
        self.set_flag(Self::FLAG_JUMP, pressed);
    }

    /// Set shield flag.
    #[inline]
    pub fn set_shield(&mut self, held: bool) {
        self.set_flag(Self::FLAG_SHIELD, held);
    }

    /// Set ability 1 flag.
    #[inline]
    pub fn set_ability1(&mut self, pressed: bool) {
        self.set_flag(Self::FLAG_ABILITY_1, pressed);
    }

    /// Set ability 2 flag.
    #[inline]
    pub fn set_ability2(&mut self, pressed: bool) {
        self.set_flag(Self::FLAG_ABILITY_2, pressed);
    }
}

// =============================================================================
// KEY LATCH
// =============================================================================

/// Snapshot of the physical controls held this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    /// Left held
    pub left: bool,
    /// Right held
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Shield held
    pub shield: bool,
    /// Ability 1 held
    pub ability1: bool,
    /// Ability 2 held
    pub ability2: bool,
}

/// Converts held-key snapshots into input frames.
///
/// Presses are reported on the first tick a key is down only, so holding an
/// ability key fires it once.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputLatch {
    previous: HeldKeys,
}

impl InputLatch {
    /// Latch with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce this tick's frame from the currently held keys.
    pub fn frame(&mut self, held: HeldKeys) -> InputFrame {
        let prev = self.previous;
        self.previous = held;

        let move_x = match (held.left, held.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };

        let mut frame = InputFrame::with_movement(move_x);
        frame.set_jump(held.jump && !prev.jump);
        frame.set_shield(held.shield);
        frame.set_ability1(held.ability1 && !prev.ability1);
        frame.set_ability2(held.ability2 && !prev.ability2);
        frame
    }

    /// Forget held keys (e.g. after a respawn or focus loss).
    pub fn reset(&mut self) {
        self.previous = HeldKeys::default();
    }
}
