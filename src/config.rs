//! Simulation and Match Configuration
//!
//! `SimConfig` holds arena geometry and the physics/combat constants shared by
//! every fighter. `MatchConfig` holds round rules. Both load from JSON and
//! fall back to defaults for missing fields.

use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected shape.
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Arena geometry and physics/combat constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Visible screen width
    pub arena_width: f32,
    /// Visible screen height
    pub arena_height: f32,
    /// Y of the floor line (fighters rest at `floor_y - height`)
    pub floor_y: f32,
    /// Left end of the floor
    pub floor_left: f32,
    /// Right end of the floor
    pub floor_right: f32,
    /// Left wall of the play area
    pub wall_left: f32,
    /// Right wall of the play area
    pub wall_right: f32,
    /// Distance beyond the screen at which a fighter is out of the match
    pub kill_margin: f32,
    /// Added to `vy` every airborne tick
    pub gravity: f32,
    /// Per-tick horizontal decay toward zero
    pub friction_step: f32,
    /// `|vx|` below this snaps to zero when decaying
    pub friction_snap: f32,
    /// Knockback grows by this fraction per point of accumulated damage
    pub knockback_scale: f32,
    /// Time between a registered hit and the defender's hurt flag clearing
    pub hurt_duration_ms: u64,
    /// Projectiles further than this past a screen edge are retired
    pub projectile_slack: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_width: 1280.0,
            arena_height: 720.0,
            floor_y: 600.0,
            floor_left: 128.0,
            floor_right: 1152.0,
            wall_left: -200.0,
            wall_right: 1480.0,
            kill_margin: 500.0,
            gravity: 0.4,
            friction_step: 0.4,
            friction_snap: 1.0,
            knockback_scale: 0.2,
            hurt_duration_ms: 1000,
            projectile_slack: 200.0,
        }
    }
}

impl SimConfig {
    /// Visible screen rectangle.
    pub fn screen(&self) -> Rect {
        Rect::new(0.0, 0.0, self.arena_width, self.arena_height)
    }

    /// Rectangle outside of which a fighter is no longer alive.
    pub fn kill_bounds(&self) -> Rect {
        self.screen().expand(self.kill_margin)
    }

    /// Hurt-clear delay as a `Duration`.
    pub fn hurt_duration(&self) -> Duration {
        Duration::from_millis(self.hurt_duration_ms)
    }

    /// Parse from a JSON string and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable by the integrator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "arena_width/arena_height",
                reason: "must be positive",
            });
        }
        if self.floor_left >= self.floor_right {
            return Err(ConfigError::Invalid {
                field: "floor_left/floor_right",
                reason: "floor must have positive length",
            });
        }
        if self.wall_left >= self.wall_right {
            return Err(ConfigError::Invalid {
                field: "wall_left/wall_right",
                reason: "walls must enclose a positive width",
            });
        }
        if self.gravity <= 0.0 {
            return Err(ConfigError::Invalid { field: "gravity", reason: "must be positive" });
        }
        if self.friction_step < 0.0 || self.friction_snap < 0.0 {
            return Err(ConfigError::Invalid {
                field: "friction_step/friction_snap",
                reason: "must not be negative",
            });
        }
        if self.knockback_scale < 0.0 {
            return Err(ConfigError::Invalid { field: "knockback_scale", reason: "must not be negative" });
        }
        if self.kill_margin < 0.0 {
            return Err(ConfigError::Invalid { field: "kill_margin", reason: "must not be negative" });
        }
        Ok(())
    }
}

/// Round rules owned by the match context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Lives each fighter starts with
    pub lives: u32,
    /// Accumulated damage at which a fighter is knocked out
    pub ko_damage: f32,
    /// Delay between a KO and the respawn
    pub respawn_delay_ms: u64,
    /// Respawn KO'd fighters automatically while they have lives left
    pub auto_respawn: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            lives: 3,
            ko_damage: 999.0,
            respawn_delay_ms: 1500,
            auto_respawn: true,
        }
    }
}

impl MatchConfig {
    /// Respawn delay as a `Duration`.
    pub fn respawn_delay(&self) -> Duration {
        Duration::from_millis(self.respawn_delay_ms)
    }

    /// Check round rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lives == 0 {
            return Err(ConfigError::Invalid { field: "lives", reason: "must be at least 1" });
        }
        if self.ko_damage <= 0.0 {
            return Err(ConfigError::Invalid { field: "ko_damage", reason: "must be positive" });
        }
        Ok(())
    }
}

/// Top-level config file: `{ "sim": {..}, "match": {..} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Physics and arena
    pub sim: SimConfig,
    /// Round rules
    #[serde(rename = "match")]
    pub match_rules: MatchConfig,
}

impl Config {
    /// Parse from a JSON string and validate both sections.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.sim.validate()?;
        config.match_rules.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
