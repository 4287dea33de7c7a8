//! # Duel Core
//!
//! Simulation core for a two-fighter 2D platform fighting game: physics,
//! animation selection, combat resolution and the fixed-step match loop.
//! Rendering, audio and input devices live outside this crate; they read
//! `Fighter::pose()` and feed `InputFrame`s.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DUEL CORE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Arena/physics constants, round rules      │
//! │                                                              │
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D float vector                           │
//! │  ├── rect.rs     - Axis-aligned rectangles                   │
//! │  ├── hash.rs     - State hashing for replay checks           │
//! │  └── scheduler.rs- Generation-stamped deferred effects       │
//! │                                                              │
//! │  game/           - Game logic                                │
//! │  ├── variant.rs  - Warrior / Archer descriptors              │
//! │  ├── fighter.rs  - Fighter state and controls                │
//! │  ├── physics.rs  - Integrator                                │
//! │  ├── animation.rs- Animation selector and pose               │
//! │  ├── combat.rs   - Abilities, hits, timeline                 │
//! │  ├── projectile.rs- Arrows                                   │
//! │  ├── input.rs    - Input frames and key latch                │
//! │  ├── state.rs    - Match state                               │
//! │  ├── tick.rs     - Simulation loop and round rules           │
//! │  ├── events.rs   - Game events                               │
//! │  └── replay.rs   - Recorded matches                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tick Order
//!
//! 1. Advance the clock and apply every deferred effect that is due
//! 2. Apply both fighters' inputs
//! 3. Update both fighters (propulsion, physics, animation)
//! 4. Move projectiles and resolve contacts
//! 5. Apply round rules (knockouts, respawns, match end)
//!
//! Deferred effects carry the generation of the fighter they target, so a
//! respawned or rematched fighter never receives a stale continuation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

use std::time::Duration;

pub mod config;
pub mod core;
pub mod game;

// Re-export commonly used types
pub use config::{Config, ConfigError, MatchConfig, SimConfig};
pub use core::rect::Rect;
pub use core::vec2::Vec2;
pub use game::fighter::{AbilitySlot, Facing, Fighter};
pub use game::input::{HeldKeys, InputFrame, InputLatch};
pub use game::state::{FighterSetup, MatchPhase, MatchState, Side};
pub use game::variant::VariantKind;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Duration of one simulation tick.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);
