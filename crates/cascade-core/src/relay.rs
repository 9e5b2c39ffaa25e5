//! Protective relay assignment.
//!
//! A relay gives a node the ability to isolate itself a fixed time `tau`
//! after it is armed. Nodes with no entry in the [`RelayAssignment`] have no
//! protection. The assignment is finalized before the engine is built and
//! never changes during a run.

use crate::fixed::Fixed64;
use crate::graph::NetworkGraph;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// Errors raised while assigning relays.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay time constant must be non-negative, got {tau} on {node:?}")]
    NegativeTau { node: NodeId, tau: Fixed64 },
    #[error("node {0:?} already has a relay")]
    AlreadyAssigned(NodeId),
    #[error("relay assigned to node {0:?} which is not in the graph")]
    UnknownNode(NodeId),
}

/// A protective relay with trip time constant `tau`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    pub tau: Fixed64,
}

/// Mapping from a subset of nodes to their relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayAssignment {
    relays: SecondaryMap<NodeId, Relay>,
}

impl RelayAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a relay with time constant `tau` on `node`.
    ///
    /// A node's relay is immutable once assigned, so a second assignment to
    /// the same node is rejected.
    pub fn assign(&mut self, node: NodeId, tau: Fixed64) -> Result<(), RelayError> {
        if tau < Fixed64::ZERO {
            return Err(RelayError::NegativeTau { node, tau });
        }
        if self.relays.contains_key(node) {
            return Err(RelayError::AlreadyAssigned(node));
        }
        self.relays.insert(node, Relay { tau });
        Ok(())
    }

    pub fn get(&self, node: NodeId) -> Option<Relay> {
        self.relays.get(node).copied()
    }

    pub fn tau(&self, node: NodeId) -> Option<Fixed64> {
        self.get(node).map(|r| r.tau)
    }

    pub fn has_relay(&self, node: NodeId) -> bool {
        self.relays.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Relay)> + '_ {
        self.relays.iter().map(|(node, relay)| (node, *relay))
    }

    /// Check that every relay sits on a node of `graph`.
    pub fn validate(&self, graph: &NetworkGraph) -> Result<(), RelayError> {
        match self.relays.keys().find(|&node| !graph.contains_node(node)) {
            Some(node) => Err(RelayError::UnknownNode(node)),
            None => Ok(()),
        }
    }
}
