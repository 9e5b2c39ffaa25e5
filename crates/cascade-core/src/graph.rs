use crate::fixed::Fixed64;
use crate::id::*;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while building the network graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),
    #[error("self loop on node {0:?}")]
    SelfLoop(NodeId),
    #[error("duplicate edge between {0:?} and {1:?}")]
    DuplicateEdge(NodeId, NodeId),
    #[error("edge length must be non-negative, got {0}")]
    NegativeLength(Fixed64),
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Per-node data stored in the network graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Human-readable label, used by scenario files and reports.
    pub label: String,
}

/// Per-edge data stored in the network graph. Edges are undirected; `a` and
/// `b` carry no orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub a: NodeId,
    pub b: NodeId,
    /// Physical length of the line. Propagation delay is
    /// `length * delay_coefficient`.
    pub length: Fixed64,
}

impl EdgeData {
    /// The endpoint opposite `node`, or `None` if `node` is not on this edge.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// NetworkGraph
// ---------------------------------------------------------------------------

/// An undirected graph of nodes and length-weighted edges, fixed for the
/// duration of a simulation run.
///
/// Adjacency is stored in a `SecondaryMap` keyed by `NodeId`, which keeps it
/// in sync with the primary `nodes` SlotMap. Node and edge iteration follow
/// insertion order as long as nothing is removed, and nothing is removed:
/// topology is built once and then frozen inside the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkGraph {
    nodes: SlotMap<NodeId, NodeData>,
    edges: SlotMap<EdgeId, EdgeData>,
    adjacency: SecondaryMap<NodeId, Vec<EdgeId>>,
}

impl NetworkGraph {
    /// Create a new, empty graph.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            adjacency: SecondaryMap::new(),
        }
    }

    /// Add a node with the given label.
    pub fn add_node(&mut self, label: impl Into<String>) -> NodeId {
        let id = self.nodes.insert(NodeData {
            label: label.into(),
        });
        self.adjacency.insert(id, Vec::new());
        id
    }

    /// Connect two distinct nodes with an undirected edge of `length`.
    pub fn connect(&mut self, a: NodeId, b: NodeId, length: Fixed64) -> Result<EdgeId, GraphError> {
        if !self.nodes.contains_key(a) {
            return Err(GraphError::NodeNotFound(a));
        }
        if !self.nodes.contains_key(b) {
            return Err(GraphError::NodeNotFound(b));
        }
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if length < Fixed64::ZERO {
            return Err(GraphError::NegativeLength(length));
        }
        if self.find_edge(a, b).is_some() {
            return Err(GraphError::DuplicateEdge(a, b));
        }

        let edge = self.edges.insert(EdgeData { a, b, length });
        for end in [a, b] {
            if let Some(adj) = self.adjacency.get_mut(end) {
                adj.push(edge);
            }
        }
        Ok(edge)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn get_node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node)
    }

    pub fn get_edge(&self, edge: EdgeId) -> Option<&EdgeData> {
        self.edges.get(edge)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    /// Iterate over all node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    /// Iterate over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Edges incident to `node`. Empty for unknown nodes.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Neighbors of `node`, paired with the edge that reaches them.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, EdgeId)> + '_ {
        self.incident_edges(node).iter().filter_map(move |&edge| {
            self.edges
                .get(edge)
                .and_then(|data| data.other(node))
                .map(|other| (other, edge))
        })
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.incident_edges(node).len()
    }

    /// Find the edge joining `a` and `b`, in either orientation.
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.incident_edges(a)
            .iter()
            .copied()
            .find(|&edge| self.edges.get(edge).and_then(|d| d.other(a)) == Some(b))
    }

    /// Look up a node by label. Labels are not required to be unique; the
    /// first match in insertion order wins.
    pub fn node_by_label(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, data)| data.label == label)
            .map(|(id, _)| id)
    }

    /// Hop count of the shortest path between `from` and `to` (BFS, ignoring
    /// lengths). `None` if no path exists or either node is unknown.
    pub fn hop_distance(&self, from: NodeId, to: NodeId) -> Option<usize> {
        if !self.contains_node(from) || !self.contains_node(to) {
            return None;
        }
        if from == to {
            return Some(0);
        }

        let mut dist: SecondaryMap<NodeId, usize> = SecondaryMap::new();
        let mut queue = VecDeque::new();
        dist.insert(from, 0);
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            let d = dist[node];
            for (next, _) in self.neighbors(node) {
                if dist.contains_key(next) {
                    continue;
                }
                if next == to {
                    return Some(d + 1);
                }
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
        None
    }

    /// Whether every node is reachable from every other. The empty graph is
    /// considered connected.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.nodes.keys().next() else {
            return true;
        };

        let mut seen: SecondaryMap<NodeId, ()> = SecondaryMap::new();
        let mut queue = VecDeque::from([start]);
        seen.insert(start, ());

        while let Some(node) = queue.pop_front() {
            for (next, _) in self.neighbors(node) {
                if seen.insert(next, ()).is_none() {
                    queue.push_back(next);
                }
            }
        }
        seen.len() == self.nodes.len()
    }
}
