//! Force-directed node placement.
//!
//! Fruchterman-Reingold spring embedding: every pair of nodes repels, every
//! edge attracts, and a linearly cooling temperature caps how far a node may
//! move per iteration. The result is centered on the origin and scaled so
//! the largest coordinate magnitude is 1. Starting positions come from the
//! caller's [`SimRng`], so a layout is reproducible from its seed.

use cascade_core::graph::NetworkGraph;
use cascade_core::id::NodeId;
use cascade_core::rng::SimRng;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// Default number of cooling iterations.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Mean per-node displacement below which the layout is considered settled.
const SETTLE_THRESHOLD: f64 = 1e-4;

/// Minimum separation used when two nodes coincide.
const MIN_DISTANCE: f64 = 0.01;

/// A 2D position in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Place every node of `graph` by spring embedding.
///
/// `order` fixes the iteration order (and therefore which random draw each
/// node's starting point receives); it must list every node exactly once.
pub fn spring_layout(
    graph: &NetworkGraph,
    order: &[NodeId],
    rng: &mut SimRng,
    iterations: usize,
) -> SecondaryMap<NodeId, Position> {
    let n = order.len();
    let mut result = SecondaryMap::new();
    if n == 0 {
        return result;
    }
    if n == 1 {
        result.insert(order[0], Position::default());
        return result;
    }

    let mut index: SecondaryMap<NodeId, usize> = SecondaryMap::new();
    for (i, &node) in order.iter().enumerate() {
        index.insert(node, i);
    }
    let links: Vec<(usize, usize)> = graph
        .edges()
        .filter_map(|(_, e)| Some((*index.get(e.a)?, *index.get(e.b)?)))
        .collect();

    let mut pos: Vec<[f64; 2]> = (0..n).map(|_| [rng.next_f64(), rng.next_f64()]).collect();

    // Optimal pairwise distance for a unit-area frame.
    let k = (1.0 / n as f64).sqrt();
    let mut temperature = extent(&pos) * 0.1;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![[0.0f64; 2]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let d = dx.hypot(dy).max(MIN_DISTANCE);
                let push = k * k / (d * d);
                displacement[i][0] += dx * push;
                displacement[i][1] += dy * push;
                displacement[j][0] -= dx * push;
                displacement[j][1] -= dy * push;
            }
        }

        for &(a, b) in &links {
            let dx = pos[a][0] - pos[b][0];
            let dy = pos[a][1] - pos[b][1];
            let d = dx.hypot(dy).max(MIN_DISTANCE);
            let pull = d / k;
            displacement[a][0] -= dx * pull;
            displacement[a][1] -= dy * pull;
            displacement[b][0] += dx * pull;
            displacement[b][1] += dy * pull;
        }

        let mut moved = 0.0;
        for (p, d) in pos.iter_mut().zip(&displacement) {
            let length = d[0].hypot(d[1]).max(MIN_DISTANCE);
            let step = [d[0] * temperature / length, d[1] * temperature / length];
            p[0] += step[0];
            p[1] += step[1];
            moved += step[0].hypot(step[1]);
        }
        temperature -= cooling;
        if moved / (n as f64) < SETTLE_THRESHOLD {
            break;
        }
    }

    rescale(&mut pos);
    for (i, &node) in order.iter().enumerate() {
        result.insert(node, Position::new(pos[i][0], pos[i][1]));
    }
    result
}

/// Largest side of the bounding box.
fn extent(pos: &[[f64; 2]]) -> f64 {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in pos {
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (max[0] - min[0]).max(max[1] - min[1])
}

/// Center on the origin and scale into `[-1, 1]`.
fn rescale(pos: &mut [[f64; 2]]) {
    let n = pos.len() as f64;
    let mean = pos
        .iter()
        .fold([0.0, 0.0], |acc, p| [acc[0] + p[0] / n, acc[1] + p[1] / n]);
    let mut limit: f64 = 0.0;
    for p in pos.iter_mut() {
        p[0] -= mean[0];
        p[1] -= mean[1];
        limit = limit.max(p[0].abs()).max(p[1].abs());
    }
    if limit > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= limit;
            p[1] /= limit;
        }
    }
}
