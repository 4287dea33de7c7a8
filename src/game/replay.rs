//! Match Replay Recording
//!
//! Records the configuration, spawn setups and every input pair of a match
//! so it can be re-simulated and checked against recorded state hashes.
//! Serialized with bincode.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::config::{MatchConfig, SimConfig};
use crate::core::hash::{StateHash, StateHasher};
use crate::game::events::GameEvent;
use crate::game::input::InputFrame;
use crate::game::state::{FighterSetup, MatchState};
use crate::game::tick::{replay_match, tick};

/// Current replay format version.
pub const REPLAY_VERSION: u8 = 1;

/// Checkpoint interval in ticks (every 10 seconds at 60Hz).
pub const CHECKPOINT_INTERVAL: u32 = 600;

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Bytes are not a valid replay.
    #[error("Failed to decode replay: {0}")]
    Decode(#[from] bincode::Error),

    /// Written by an incompatible version.
    #[error("Unsupported replay version {0}")]
    UnsupportedVersion(u8),

    /// Re-simulation diverged from the recording.
    #[error("State hash mismatch at tick {tick}")]
    HashMismatch {
        /// First tick whose hash differs.
        tick: u32,
    },

    /// Recording was never finalized.
    #[error("Replay has no final hash")]
    Incomplete,
}

/// State hash recorded at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick number.
    pub tick: u32,

    /// State hash after this tick.
    pub state_hash: StateHash,
}

/// Everything needed to re-simulate a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Replay {
    /// Format version.
    pub version: u8,

    /// Arena and physics constants.
    pub sim: SimConfig,

    /// Round rules.
    pub rules: MatchConfig,

    /// Spawn setups for both sides.
    pub setups: [FighterSetup; 2],

    /// Fixed step used for every tick.
    pub tick_duration: Duration,

    /// One input pair per tick.
    pub frames: Vec<[InputFrame; 2]>,

    /// Periodic state hashes.
    pub checkpoints: Vec<Checkpoint>,

    /// Hash of the final state.
    pub final_hash: Option<StateHash>,
}

impl Replay {
    /// Start recording a match that begins in `state`.
    pub fn new(state: &MatchState, tick_duration: Duration) -> Self {
        Self {
            version: REPLAY_VERSION,
            sim: state.sim.clone(),
            rules: state.rules.clone(),
            setups: state.setups,
            tick_duration,
            frames: Vec::new(),
            checkpoints: Vec::new(),
            final_hash: None,
        }
    }

    /// Record the inputs of a tick that produced `state`.
    pub fn record(&mut self, inputs: [InputFrame; 2], state: &MatchState) {
        self.frames.push(inputs);
        if state.tick % CHECKPOINT_INTERVAL == 0 {
            self.checkpoints.push(Checkpoint {
                tick: state.tick,
                state_hash: state.compute_hash(),
            });
        }
    }

    /// Finalize with the state after the last recorded tick.
    pub fn finalize(&mut self, state: &MatchState) {
        self.final_hash = Some(state.compute_hash());
    }

    /// Fresh match state matching the recording's start.
    pub fn initial_state(&self) -> MatchState {
        MatchState::new(self.sim.clone(), self.rules.clone(), self.setups)
    }

    /// Re-simulate every recorded frame.
    pub fn run(&self) -> (MatchState, Vec<GameEvent>) {
        replay_match(self.initial_state(), &self.frames, self.tick_duration)
    }

    /// Re-simulate and compare against every checkpoint and the final hash.
    pub fn verify(&self) -> Result<StateHash, ReplayError> {
        let expected_final = self.final_hash.ok_or(ReplayError::Incomplete)?;
        let mut state = self.initial_state();
        let mut checkpoints = self.checkpoints.iter().peekable();

        for inputs in &self.frames {
            tick(&mut state, inputs, self.tick_duration);
            if let Some(checkpoint) = checkpoints.next_if(|c| c.tick == state.tick) {
                if checkpoint.state_hash != state.compute_hash() {
                    return Err(ReplayError::HashMismatch { tick: state.tick });
                }
            }
        }

        let actual = state.compute_hash();
        if actual != expected_final {
            return Err(ReplayError::HashMismatch { tick: state.tick });
        }
        Ok(actual)
    }

    /// Digest of every recorded input frame, in order.
    pub fn input_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_inputs();
        hasher.update_u32(self.frames.len() as u32);
        for pair in &self.frames {
            for input in pair {
                hasher.update_u8(input.move_x as u8);
                hasher.update_u8(input.flags);
            }
        }
        hasher.finalize()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        let replay: Self = bincode::deserialize(data)?;
        if replay.version != REPLAY_VERSION {
            return Err(ReplayError::UnsupportedVersion(replay.version));
        }
        Ok(replay)
    }
}
