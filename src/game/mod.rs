//! Game Logic Module
//!
//! All fighting-game simulation code.
//!
//! ## Module Structure
//!
//! - `variant`: Per-character capability descriptors
//! - `fighter`: Fighter state and control surface
//! - `physics`: Gravity, friction, walls, floor, liveness
//! - `animation`: Animation selection, frame stepping, render pose
//! - `combat`: Abilities, deferred phases, hit application
//! - `projectile`: Straight-line shots
//! - `input`: Input frames and key latching
//! - `state`: Match state (session context)
//! - `tick`: Fixed-step simulation loop and round rules
//! - `events`: Game events for logging and verification
//! - `replay`: Recorded matches

pub mod variant;
pub mod fighter;
pub mod physics;
pub mod animation;
pub mod combat;
pub mod projectile;
pub mod input;
pub mod state;
pub mod tick;
pub mod events;
pub mod replay;

// Re-export key types
pub use variant::{AnimationId, VariantKind, VariantSpec};
pub use fighter::{AbilitySlot, Facing, Fighter};
pub use animation::Pose;
pub use combat::{Effect, HitOutcome, Timeline};
pub use projectile::Projectile;
pub use input::{HeldKeys, InputFrame, InputLatch};
pub use state::{FighterSetup, MatchPhase, MatchState, Side};
pub use tick::{TickResult, replay_match, tick};
pub use events::{GameEvent, GameEventData, HitSource};
pub use replay::{Replay, ReplayError};
