//! Binary export of a finished run via `bitcode` with a versioned header.
//!
//! A [`RunRecord`] bundles everything a renderer needs to replay a run
//! without the engine: the frozen graph, relay assignment, parameters, seed
//! node, and the status log.

use crate::engine::Engine;
use crate::graph::NetworkGraph;
use crate::id::NodeId;
use crate::log::StatusLog;
use crate::relay::RelayAssignment;
use crate::sim::SimParams;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a cascade run record.
pub const RECORD_MAGIC: u32 = 0xCA5C_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", RECORD_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("record from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header stored with every record. Checked before the payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub magic: u32,
    pub version: u32,
    /// Number of snapshots in the log.
    pub ticks: u64,
}

impl RecordHeader {
    pub fn new(ticks: u64) -> Self {
        Self {
            magic: RECORD_MAGIC,
            version: FORMAT_VERSION,
            ticks,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != RECORD_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run record
// ---------------------------------------------------------------------------

/// A self-contained copy of a run: inputs plus the produced log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub header: RecordHeader,
    pub graph: NetworkGraph,
    pub relays: RelayAssignment,
    pub params: SimParams,
    pub seed: NodeId,
    pub log: StatusLog,
}

impl RunRecord {
    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode from bytes, rejecting records from other format versions.
    pub fn decode(data: &[u8]) -> Result<Self, DeserializeError> {
        let record: RunRecord =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        record.header.validate()?;
        Ok(record)
    }
}

impl Engine {
    /// Copy the engine's inputs and log into a [`RunRecord`].
    pub fn record(&self) -> RunRecord {
        RunRecord {
            header: RecordHeader::new(self.log().len() as u64),
            graph: self.graph().clone(),
            relays: self.relays().clone(),
            params: self.params(),
            seed: self.seed(),
            log: self.log().clone(),
        }
    }
}
