//! Core primitives.
//!
//! Geometry, state hashing and the deferred-effect scheduler. Nothing in
//! here knows about fighters.

pub mod vec2;
pub mod rect;
pub mod hash;
pub mod scheduler;

// Re-export core types
pub use vec2::Vec2;
pub use rect::Rect;
pub use hash::{StateHash, StateHasher, compute_state_hash};
pub use scheduler::{Scheduled, Scheduler};
