//! Simulation parameters, clock state and the run-comparison hash.

use crate::fixed::{Fixed64, Ticks, time_at};
use crate::graph::GraphError;
use crate::id::NodeId;
use crate::relay::RelayError;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Problems detected before the first tick. The simulation does not start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("seed node {0:?} is not in the graph")]
    UnknownSeed(NodeId),
    #[error("delay coefficient must be positive, got {0}")]
    NonPositiveDelayCoefficient(Fixed64),
    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(Fixed64),
    #[error("tick count must be positive")]
    NonPositiveTickCount,
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Fixed parameters of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimParams {
    /// Propagation delay per unit of edge length.
    pub delay_coefficient: Fixed64,
    /// Duration of one tick.
    pub time_step: Fixed64,
}

impl SimParams {
    pub fn new(delay_coefficient: Fixed64, time_step: Fixed64) -> Self {
        Self {
            delay_coefficient,
            time_step,
        }
    }

    /// Both values must be strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_coefficient <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveDelayCoefficient(
                self.delay_coefficient,
            ));
        }
        if self.time_step <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveTimeStep(self.time_step));
        }
        Ok(())
    }

    /// Propagation delay across an edge of `length`.
    pub fn delay(&self, length: Fixed64) -> Fixed64 {
        length.saturating_mul(self.delay_coefficient)
    }

    /// Simulated time at the start of `tick`.
    pub fn time_at(&self, tick: Ticks) -> Fixed64 {
        time_at(self.time_step, tick)
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Clock state tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Index of the next tick to run. Incremented by 1 per step.
    pub tick: Ticks,
}

impl SimState {
    /// Create a new simulation state starting at tick 0.
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Feed an optional Fixed64, distinguishing `None` from any value.
    pub fn write_opt_fixed64(&mut self, v: Option<Fixed64>) {
        match v {
            Some(v) => {
                self.write_u8(1);
                self.write_fixed64(v);
            }
            None => self.write_u8(0),
        }
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
