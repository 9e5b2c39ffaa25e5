//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::graph::NetworkGraph;
use crate::id::NodeId;
use crate::relay::RelayAssignment;
use crate::sim::SimParams;

// ===========================================================================
// Fixed-point helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn params(delay_coefficient: f64, time_step: f64) -> SimParams {
    SimParams::new(fixed(delay_coefficient), fixed(time_step))
}

// ===========================================================================
// Graph builders
// ===========================================================================

/// `n` nodes labelled `n0..n{n-1}` joined in a line, every edge `length`.
pub fn path_graph(n: usize, length: f64) -> (NetworkGraph, Vec<NodeId>) {
    let mut graph = NetworkGraph::new();
    let nodes: Vec<NodeId> = (0..n).map(|i| graph.add_node(format!("n{i}"))).collect();
    for pair in nodes.windows(2) {
        graph
            .connect(pair[0], pair[1], fixed(length))
            .expect("path edges are valid");
    }
    (graph, nodes)
}

/// Two nodes `a` and `b` joined by one edge of `length`.
pub fn two_node_graph(length: f64) -> (NetworkGraph, Vec<NodeId>) {
    let mut graph = NetworkGraph::new();
    let a = graph.add_node("a");
    let b = graph.add_node("b");
    graph.connect(a, b, fixed(length)).expect("edge is valid");
    (graph, vec![a, b])
}

/// A hub with `leaves` spokes of `length`. Returns `(graph, hub, leaves)`.
pub fn star_graph(leaves: usize, length: f64) -> (NetworkGraph, NodeId, Vec<NodeId>) {
    let mut graph = NetworkGraph::new();
    let hub = graph.add_node("hub");
    let spokes: Vec<NodeId> = (0..leaves)
        .map(|i| {
            let leaf = graph.add_node(format!("leaf{i}"));
            graph.connect(hub, leaf, fixed(length)).expect("spoke is valid");
            leaf
        })
        .collect();
    (graph, hub, spokes)
}

/// A `width` x `height` lattice with unit-length edges, row-major node order.
pub fn grid_graph(width: usize, height: usize) -> (NetworkGraph, Vec<NodeId>) {
    let mut graph = NetworkGraph::new();
    let nodes: Vec<NodeId> = (0..width * height)
        .map(|i| graph.add_node(format!("g{}_{}", i % width, i / width)))
        .collect();
    for y in 0..height {
        for x in 0..width {
            let here = nodes[y * width + x];
            if x + 1 < width {
                graph
                    .connect(here, nodes[y * width + x + 1], fixed(1.0))
                    .expect("grid edge is valid");
            }
            if y + 1 < height {
                graph
                    .connect(here, nodes[(y + 1) * width + x], fixed(1.0))
                    .expect("grid edge is valid");
            }
        }
    }
    (graph, nodes)
}

// ===========================================================================
// Relays and engines
// ===========================================================================

pub fn relays_on(entries: &[(NodeId, f64)]) -> RelayAssignment {
    let mut relays = RelayAssignment::new();
    for &(node, tau) in entries {
        relays.assign(node, fixed(tau)).expect("relay is valid");
    }
    relays
}

/// Engine over `graph` with no relays.
pub fn unprotected_engine(graph: NetworkGraph, seed: NodeId, coefficient: f64, step: f64) -> Engine {
    Engine::new(graph, RelayAssignment::new(), params(coefficient, step), seed)
        .expect("valid engine configuration")
}
