use crate::fixed::Fixed64;
use crate::id::NodeId;
use crate::status::NodeStatus;

// ---------------------------------------------------------------------------
// Node report
// ---------------------------------------------------------------------------

/// A read-only copy of one node's engine state.
///
/// Built on demand from the engine's live records. Holding one never
/// borrows the engine, and changing it has no effect on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeReport {
    pub id: NodeId,
    pub status: NodeStatus,
    /// Time the node entered `Fault`, if it ever did.
    pub fault_arrival: Option<Fixed64>,
    /// Pending relay deadline, if one is armed.
    pub trip_deadline: Option<Fixed64>,
    /// Relay time constant, if the node is protected.
    pub relay_tau: Option<Fixed64>,
}

impl NodeReport {
    pub fn has_relay(&self) -> bool {
        self.relay_tau.is_some()
    }
}
