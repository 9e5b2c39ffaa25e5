//! Random network generation for the cascade engine.
//!
//! Builds the inputs an [`Engine`](cascade_core::engine::Engine) needs from
//! a handful of numbers: a random spanning tree, a few redundant edges that
//! close long loops, a spring layout whose Euclidean distances become edge
//! lengths, a random relay assignment, and a random seed node. Every draw
//! comes from a [`SimRng`] seeded by [`TopologyConfig::rng_seed`], so the
//! same config always produces the same network.

pub mod layout;

pub use layout::{DEFAULT_ITERATIONS, Position, spring_layout};

use cascade_core::fixed::{Fixed64, f64_to_fixed64};
use cascade_core::graph::{GraphError, NetworkGraph};
use cascade_core::id::{EdgeId, NodeId};
use cascade_core::relay::{RelayAssignment, RelayError};
use cascade_core::rng::SimRng;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, info};

/// Attempts allowed per requested redundant edge before giving up.
const ATTEMPTS_PER_EDGE: usize = 1000;

/// Offset that separates the layout's random stream from the topology's.
const LAYOUT_STREAM: u64 = 0x5EED_1A70_u64;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors raised while generating a network.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("a network needs at least one node")]
    NoNodes,
    #[error("{name} must be a finite value in [0, 1], got {value}")]
    InvalidRatio { name: &'static str, value: f64 },
    #[error("redundancy_ratio must be finite and non-negative, got {0}")]
    InvalidRedundancy(f64),
    #[error("relay_ratio is positive but relay_taus is empty")]
    NoRelayTaus,
    #[error("relay time constant must be finite and non-negative, got {0}")]
    InvalidTau(f64),
    #[error("placed only {placed} of {requested} redundant edges")]
    RedundancyExhausted { placed: usize, requested: usize },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

// ===========================================================================
// Configuration
// ===========================================================================

/// Parameters of a generated network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Number of nodes.
    pub nodes: usize,
    /// Redundant edges to add, as a fraction of `nodes` (truncated).
    pub redundancy_ratio: f64,
    /// Probability that a node receives a relay.
    pub relay_ratio: f64,
    /// Candidate relay time constants, drawn uniformly.
    pub relay_taus: Vec<f64>,
    /// Seed for every random draw.
    pub rng_seed: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            nodes: 50,
            redundancy_ratio: 0.2,
            relay_ratio: 0.6,
            relay_taus: vec![0.2, 0.5, 2.0],
            rng_seed: 42,
        }
    }
}

impl TopologyConfig {
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.nodes == 0 {
            return Err(TopologyError::NoNodes);
        }
        if !self.redundancy_ratio.is_finite() || self.redundancy_ratio < 0.0 {
            return Err(TopologyError::InvalidRedundancy(self.redundancy_ratio));
        }
        if !(0.0..=1.0).contains(&self.relay_ratio) {
            return Err(TopologyError::InvalidRatio {
                name: "relay_ratio",
                value: self.relay_ratio,
            });
        }
        if self.relay_ratio > 0.0 && self.relay_taus.is_empty() {
            return Err(TopologyError::NoRelayTaus);
        }
        if let Some(&tau) = self
            .relay_taus
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return Err(TopologyError::InvalidTau(tau));
        }
        Ok(())
    }

    /// Number of redundant edges requested.
    pub fn redundant_edges(&self) -> usize {
        (self.nodes as f64 * self.redundancy_ratio) as usize
    }
}

// ===========================================================================
// Output
// ===========================================================================

/// A generated network, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct GeneratedNetwork {
    pub graph: NetworkGraph,
    /// Node ids in generation order; node `i` is labelled `"i"`.
    pub nodes: Vec<NodeId>,
    pub positions: SecondaryMap<NodeId, Position>,
    pub relays: RelayAssignment,
    pub seed: NodeId,
    /// Edges added on top of the spanning tree.
    pub redundant: Vec<EdgeId>,
}

// ===========================================================================
// Generation
// ===========================================================================

/// Generate a network from `config`.
pub fn generate(config: &TopologyConfig) -> Result<GeneratedNetwork, TopologyError> {
    config.validate()?;
    let mut rng = SimRng::new(config.rng_seed);

    // Structure first, with unit lengths; real lengths come from the layout.
    let mut graph = NetworkGraph::new();
    let nodes: Vec<NodeId> = (0..config.nodes)
        .map(|i| graph.add_node(i.to_string()))
        .collect();
    for (a, b) in random_tree(config.nodes, &mut rng) {
        graph.connect(nodes[a], nodes[b], Fixed64::ONE)?;
    }
    let redundant_pairs = add_redundant_edges(&mut graph, &nodes, config.redundant_edges(), &mut rng)?;

    let mut layout_rng = SimRng::new(config.rng_seed.wrapping_add(LAYOUT_STREAM));
    let positions = spring_layout(&graph, &nodes, &mut layout_rng, DEFAULT_ITERATIONS);

    // Rebuild with Euclidean lengths, keeping edge insertion order.
    let mut sized = NetworkGraph::new();
    let sized_nodes: Vec<NodeId> = (0..config.nodes)
        .map(|i| sized.add_node(i.to_string()))
        .collect();
    let mut redundant = Vec::with_capacity(redundant_pairs.len());
    let mut index: SecondaryMap<NodeId, usize> = SecondaryMap::new();
    for (i, &node) in nodes.iter().enumerate() {
        index.insert(node, i);
    }
    for (edge, data) in graph.edges() {
        let (Some(&a), Some(&b)) = (index.get(data.a), index.get(data.b)) else {
            continue;
        };
        let length = positions[data.a].distance(&positions[data.b]);
        let id = sized.connect(sized_nodes[a], sized_nodes[b], f64_to_fixed64(length))?;
        if redundant_pairs.contains(&edge) {
            redundant.push(id);
        }
    }
    let positions = sized_nodes
        .iter()
        .zip(&nodes)
        .map(|(&new, &old)| (new, positions[old]))
        .collect();

    let relays = assign_relays(&sized_nodes, config.relay_ratio, &config.relay_taus, &mut rng)?;
    let seed = sized_nodes[rng.below(sized_nodes.len())];

    info!(
        nodes = sized.node_count(),
        edges = sized.edge_count(),
        redundant = redundant.len(),
        relays = relays.len(),
        rng_seed = config.rng_seed,
        "network generated"
    );

    Ok(GeneratedNetwork {
        graph: sized,
        nodes: sized_nodes,
        positions,
        relays,
        seed,
        redundant,
    })
}

/// A uniformly random labelled tree on `n` nodes, as `(child, parent)`
/// index pairs, decoded from a random Prüfer sequence.
pub fn random_tree(n: usize, rng: &mut SimRng) -> Vec<(usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    let sequence: Vec<usize> = (0..n - 2).map(|_| rng.below(n)).collect();
    let mut degree = vec![1usize; n];
    for &p in &sequence {
        degree[p] += 1;
    }

    let mut edges = Vec::with_capacity(n - 1);
    for &p in &sequence {
        // A Prüfer sequence of length n - 2 always leaves a leaf available.
        if let Some(leaf) = degree.iter().position(|&d| d == 1) {
            edges.push((leaf, p));
            degree[leaf] -= 1;
            degree[p] -= 1;
        }
    }
    let remaining: Vec<usize> = (0..n).filter(|&i| degree[i] == 1).collect();
    if let [a, b] = remaining[..] {
        edges.push((a, b));
    }
    edges
}

/// Add `count` edges between random node pairs that are more than two hops
/// apart. Returns the new edge ids.
pub fn add_redundant_edges(
    graph: &mut NetworkGraph,
    nodes: &[NodeId],
    count: usize,
    rng: &mut SimRng,
) -> Result<Vec<EdgeId>, TopologyError> {
    let mut added = Vec::with_capacity(count);
    let mut attempts = count.saturating_mul(ATTEMPTS_PER_EDGE);

    while added.len() < count {
        if attempts == 0 {
            return Err(TopologyError::RedundancyExhausted {
                placed: added.len(),
                requested: count,
            });
        }
        attempts -= 1;

        let Some((i, j)) = rng.distinct_pair(nodes.len()) else {
            continue;
        };
        let (a, b) = (nodes[i], nodes[j]);
        if graph.find_edge(a, b).is_some() {
            continue;
        }
        if graph.hop_distance(a, b).is_some_and(|d| d > 2) {
            added.push(graph.connect(a, b, Fixed64::ONE)?);
            debug!(a = i, b = j, "redundant edge added");
        }
    }
    Ok(added)
}

/// Give each node a relay with probability `ratio`, its time constant drawn
/// uniformly from `taus`.
pub fn assign_relays(
    nodes: &[NodeId],
    ratio: f64,
    taus: &[f64],
    rng: &mut SimRng,
) -> Result<RelayAssignment, TopologyError> {
    let mut relays = RelayAssignment::new();
    for &node in nodes {
        if !rng.chance(ratio) {
            continue;
        }
        if let Some(&tau) = rng.pick(taus) {
            relays.assign(node, f64_to_fixed64(tau))?;
        }
    }
    Ok(relays)
}
