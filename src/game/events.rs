//! Game Events
//!
//! Events generated during simulation for logging, tests and replay checks.

use serde::{Serialize, Deserialize};

use crate::game::fighter::AbilitySlot;
use crate::game::state::Side;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Knockouts first
    Knockout = 0,
    /// Then hits, blocks and interruptions
    Strike = 1,
    /// Then ability activations and projectile spawns
    Ability = 2,
    /// Then respawns
    Respawn = 3,
    /// Lowest priority
    Other = 255,
}

/// Where a hit came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitSource {
    /// Attack-range overlap at strike resolution
    Melee,
    /// Projectile contact
    Projectile,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// An ability was accepted
    AbilityStarted {
        /// Fighter that started it
        side: Side,
        /// Which ability
        slot: AbilitySlot,
    },

    /// A hit registered on an unshielded defender
    StrikeLanded {
        /// Fighter that dealt the hit
        attacker: Side,
        /// Fighter that took it
        defender: Side,
        /// Melee or projectile
        source: HitSource,
        /// Damage added by this hit
        damage: f32,
        /// Defender's accumulated damage afterwards
        total_damage: f32,
        /// Horizontal impulse applied (signed)
        knockback: f32,
    },

    /// A hit met a raised shield
    StrikeBlocked {
        /// Fighter that dealt the hit
        attacker: Side,
        /// Shielding fighter
        defender: Side,
        /// Melee or projectile
        source: HitSource,
    },

    /// A melee strike resolved with nothing in range
    StrikeMissed {
        /// Fighter whose strike missed
        attacker: Side,
    },

    /// A strike or shot dealt nothing because the attacker was hurt
    AttackInterrupted {
        /// Hurt attacker
        side: Side,
    },

    /// A projectile was spawned
    ProjectileFired {
        /// Fighter that fired it
        owner: Side,
    },

    /// A fighter was knocked out
    FighterKnockedOut {
        /// Knocked-out fighter
        side: Side,
        /// Lives remaining after this knockout
        lives_left: u32,
    },

    /// A fighter re-entered the arena
    FighterRespawned {
        /// Respawned fighter
        side: Side,
        /// Lives of the new instance
        lives: u32,
    },

    /// Match ended
    MatchEnded {
        /// Winning side; `None` for a draw
        winner: Option<Side>,
        /// Ticks played
        duration_ticks: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Fighter involved (for tie-breaking)
    pub side: Option<Side>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let side = match &data {
            GameEventData::AbilityStarted { side, .. } => Some(*side),
            GameEventData::StrikeLanded { attacker, .. } => Some(*attacker),
            GameEventData::StrikeBlocked { attacker, .. } => Some(*attacker),
            GameEventData::StrikeMissed { attacker } => Some(*attacker),
            GameEventData::AttackInterrupted { side } => Some(*side),
            GameEventData::ProjectileFired { owner } => Some(*owner),
            GameEventData::FighterKnockedOut { side, .. } => Some(*side),
            GameEventData::FighterRespawned { side, .. } => Some(*side),
            GameEventData::MatchEnded { winner, .. } => *winner,
        };

        Self {
            tick,
            priority,
            side,
            data,
        }
    }

    /// Create ability started event.
    pub fn ability_started(tick: u32, side: Side, slot: AbilitySlot) -> Self {
        Self::new(tick, EventPriority::Ability, GameEventData::AbilityStarted { side, slot })
    }

    /// Create strike landed event.
    pub fn strike_landed(
        tick: u32,
        attacker: Side,
        defender: Side,
        source: HitSource,
        damage: f32,
        total_damage: f32,
        knockback: f32,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Strike,
            GameEventData::StrikeLanded {
                attacker,
                defender,
                source,
                damage,
                total_damage,
                knockback,
            },
        )
    }

    /// Create strike blocked event.
    pub fn strike_blocked(tick: u32, attacker: Side, defender: Side, source: HitSource) -> Self {
        Self::new(
            tick,
            EventPriority::Strike,
            GameEventData::StrikeBlocked { attacker, defender, source },
        )
    }

    /// Create strike missed event.
    pub fn strike_missed(tick: u32, attacker: Side) -> Self {
        Self::new(tick, EventPriority::Strike, GameEventData::StrikeMissed { attacker })
    }

    /// Create attack interrupted event.
    pub fn attack_interrupted(tick: u32, side: Side) -> Self {
        Self::new(tick, EventPriority::Strike, GameEventData::AttackInterrupted { side })
    }

    /// Create projectile fired event.
    pub fn projectile_fired(tick: u32, owner: Side) -> Self {
        Self::new(tick, EventPriority::Ability, GameEventData::ProjectileFired { owner })
    }

    /// Create knockout event.
    pub fn knocked_out(tick: u32, side: Side, lives_left: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Knockout,
            GameEventData::FighterKnockedOut { side, lives_left },
        )
    }

    /// Create respawn event.
    pub fn respawned(tick: u32, side: Side, lives: u32) -> Self {
        Self::new(tick, EventPriority::Respawn, GameEventData::FighterRespawned { side, lives })
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, winner: Option<Side>) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::MatchEnded {
                winner,
                duration_ticks: tick,
            },
        )
    }

    /// Landed hit fields, if this is one: `(attacker, defender, damage, knockback)`.
    pub fn as_hit(&self) -> Option<(Side, Side, f32, f32)> {
        match self.data {
            GameEventData::StrikeLanded { attacker, defender, damage, knockback, .. } => {
                Some((attacker, defender, damage, knockback))
            }
            _ => None,
        }
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.side == other.side
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then side
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.side.cmp(&other.side))
    }
}
