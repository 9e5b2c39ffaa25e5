//! Criterion benchmarks for the cascade engine.
//!
//! Two benchmark groups:
//! - `grid_unprotected`: 50x50 lattice, no relays -- the fault front sweeps the grid
//! - `grid_protected`: same lattice, every third node protected -- exercises arming and blocking

use cascade_core::engine::Engine;
use cascade_core::graph::NetworkGraph;
use cascade_core::id::NodeId;
use cascade_core::relay::RelayAssignment;
use cascade_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

const SIDE: usize = 50;
const TICKS: u64 = 120;

fn build_grid() -> (NetworkGraph, Vec<NodeId>) {
    grid_graph(SIDE, SIDE)
}

fn bench_unprotected(c: &mut Criterion) {
    let (graph, nodes) = build_grid();
    let seed = nodes[SIDE * SIDE / 2];

    c.bench_function("grid_unprotected/120_ticks", |b| {
        b.iter(|| {
            let mut engine = unprotected_engine(graph.clone(), seed, 0.5, 0.5);
            engine.run(TICKS).unwrap();
            engine.state_hash()
        })
    });
}

fn bench_protected(c: &mut Criterion) {
    let (graph, nodes) = build_grid();
    let seed = nodes[SIDE * SIDE / 2];
    let taus = [0.2, 0.5, 2.0];
    let mut relays = RelayAssignment::new();
    for (i, &node) in nodes.iter().enumerate().filter(|(i, _)| i % 3 == 0) {
        relays.assign(node, fixed(taus[i % taus.len()])).unwrap();
    }

    c.bench_function("grid_protected/120_ticks", |b| {
        b.iter(|| {
            let mut engine =
                Engine::new(graph.clone(), relays.clone(), params(0.5, 0.5), seed).unwrap();
            engine.run(TICKS).unwrap();
            engine.state_hash()
        })
    });
}

criterion_group!(benches, bench_unprotected, bench_protected);
criterion_main!(benches);
