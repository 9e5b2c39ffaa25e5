//! Property-based tests for the cascade engine.
//!
//! Uses proptest to generate random networks, relay assignments and
//! parameters, then verify the engine's structural invariants hold.

use cascade_core::engine::Engine;
use cascade_core::fixed::{Fixed64, time_at};
use cascade_core::graph::NetworkGraph;
use cascade_core::id::NodeId;
use cascade_core::relay::RelayAssignment;
use cascade_core::sim::SimParams;
use cascade_core::status::NodeStatus;
use cascade_core::test_utils::*;
use cascade_core::validation::{check_log, diff_logs};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Inputs for one engine, kept as plain data so a case can be rebuilt.
#[derive(Debug, Clone)]
struct Scenario {
    nodes: usize,
    /// `(a, b, length)` by node index.
    edges: Vec<(usize, usize, f64)>,
    /// `Some(tau)` per node index.
    relays: Vec<Option<f64>>,
    seed: usize,
    coefficient: f64,
    step: f64,
}

impl Scenario {
    fn build(&self) -> (Engine, Vec<NodeId>) {
        let mut graph = NetworkGraph::new();
        let ids: Vec<NodeId> = (0..self.nodes).map(|i| graph.add_node(format!("n{i}"))).collect();
        for &(a, b, length) in &self.edges {
            // Duplicate pairs from the generator are simply skipped.
            let _ = graph.connect(ids[a], ids[b], fixed(length));
        }
        let mut relays = RelayAssignment::new();
        for (i, tau) in self.relays.iter().enumerate() {
            if let Some(tau) = tau {
                relays.assign(ids[i], fixed(*tau)).unwrap();
            }
        }
        let engine = Engine::new(
            graph,
            relays,
            params(self.coefficient, self.step),
            ids[self.seed],
        )
        .unwrap();
        (engine, ids)
    }
}

/// A random connected network: a random tree plus a few extra edges.
fn arb_scenario(max_nodes: usize) -> impl Strategy<Value = Scenario> {
    (2..=max_nodes).prop_flat_map(|n| {
        (
            proptest::collection::vec((any::<prop::sample::Index>(), 0.0..3.0f64), n - 1),
            proptest::collection::vec((0..n, 0..n, 0.0..3.0f64), 0..n),
            proptest::collection::vec(
                proptest::option::weighted(0.6, prop_oneof![Just(0.2), Just(0.5), Just(2.0)]),
                n,
            ),
            0..n,
            prop_oneof![Just(1.0), Just(2.0), Just(0.75)],
            prop_oneof![Just(0.25), Just(0.5), Just(1.0)],
        )
            .prop_map(move |(tree, extra, relays, seed, coefficient, step)| {
                let mut edges: Vec<(usize, usize, f64)> = tree
                    .into_iter()
                    .enumerate()
                    .map(|(i, (parent, length))| (i + 1, parent.index(i + 1), length))
                    .collect();
                edges.extend(extra.into_iter().filter(|(a, b, _)| a != b));
                Scenario {
                    nodes: n,
                    edges,
                    relays,
                    seed,
                    coefficient,
                    step,
                }
            })
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Status never decreases for any node, and the log is well formed.
    #[test]
    fn status_is_monotonic(scenario in arb_scenario(30)) {
        let (mut engine, ids) = scenario.build();
        engine.run(60).unwrap();
        prop_assert_eq!(check_log(engine.log()), Ok(()));

        for &node in &ids {
            let history: Vec<NodeStatus> = engine.log().history(node).flatten().collect();
            prop_assert!(history.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    /// A node's fault arrival time is written at most once.
    #[test]
    fn fault_arrival_written_once(scenario in arb_scenario(30)) {
        let (mut engine, ids) = scenario.build();
        let mut seen: Vec<Option<Fixed64>> = vec![None; ids.len()];
        seen[scenario.seed] = Some(Fixed64::ZERO);

        for _ in 0..60 {
            engine.step();
            for (i, &node) in ids.iter().enumerate() {
                let arrival = engine.node_report(node).unwrap().fault_arrival;
                if let Some(previous) = seen[i] {
                    prop_assert_eq!(arrival, Some(previous));
                }
                seen[i] = arrival;
            }
        }
    }

    /// A node that faults during the run carries the tick time it faulted at.
    #[test]
    fn fault_arrival_matches_first_fault_tick(scenario in arb_scenario(30)) {
        let (mut engine, ids) = scenario.build();
        engine.run(60).unwrap();
        let step = fixed(scenario.step);

        for (i, &node) in ids.iter().enumerate() {
            if i == scenario.seed {
                continue;
            }
            let report = engine.node_report(node).unwrap();
            match engine.log().first_tick_with(node, NodeStatus::Fault) {
                Some(tick) => prop_assert_eq!(report.fault_arrival, Some(time_at(step, tick))),
                None => prop_assert_eq!(report.fault_arrival, None),
            }
        }
    }

    /// Two runs from identical inputs produce identical logs and hashes.
    #[test]
    fn deterministic_simulation(scenario in arb_scenario(40)) {
        let (mut a, _) = scenario.build();
        let (mut b, _) = scenario.build();
        a.run(60).unwrap();
        b.run(60).unwrap();

        prop_assert_eq!(diff_logs(a.log(), b.log()), None);
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    /// With exactly one seeded fault, nothing faults without a faulted path
    /// back to the seed: every other faulted node has a neighbor that was
    /// faulted strictly earlier.
    #[test]
    fn faults_have_an_earlier_faulted_neighbor(scenario in arb_scenario(30)) {
        let (mut engine, ids) = scenario.build();
        engine.run(60).unwrap();

        for (i, &node) in ids.iter().enumerate() {
            if i == scenario.seed {
                continue;
            }
            let Some(arrival) = engine.node_report(node).unwrap().fault_arrival else {
                continue;
            };
            let has_source = engine.graph().neighbors(node).any(|(neighbor, _)| {
                engine
                    .node_report(neighbor)
                    .and_then(|r| r.fault_arrival)
                    .is_some_and(|t| t < arrival)
            });
            prop_assert!(has_source);
        }
    }

    /// A relay whose deadline is no later than the signal's arrival keeps
    /// the node out of `Fault` for the whole run.
    #[test]
    fn fast_relay_always_blocks(
        length in 0.05..5.0f64,
        tau in 0.0..4.0f64,
        step in prop_oneof![Just(0.1), Just(0.25), Just(0.5), Just(1.0)],
    ) {
        let (graph, nodes) = two_node_graph(length);
        let params = SimParams::new(fixed(2.0), fixed(step));
        let arrival = params.delay(fixed(length));
        // The protected node is armed at t = 0, the first tick.
        let deadline = fixed(tau);

        let relays = relays_on(&[(nodes[1], tau)]);
        let mut engine = Engine::new(graph, relays, params, nodes[0]).unwrap();
        engine.run(120).unwrap();

        if deadline <= arrival {
            prop_assert!(!engine.log().ever(nodes[1], NodeStatus::Fault));
            prop_assert_eq!(engine.status(nodes[1]), Some(NodeStatus::Tripped));
        } else {
            prop_assert!(engine.log().ever(nodes[1], NodeStatus::Fault));
        }
    }

    /// Without a relay the signal takes effect on the first tick at or after
    /// its arrival, stamped with that tick's time.
    #[test]
    fn unblocked_signal_lands_on_first_tick_after_arrival(
        length in 0.0..5.0f64,
        step in prop_oneof![Just(0.1), Just(0.25), Just(0.5), Just(1.0)],
    ) {
        let (graph, nodes) = two_node_graph(length);
        let params = SimParams::new(fixed(2.0), fixed(step));
        let arrival = params.delay(fixed(length));
        let expected_tick = (0u64..).find(|&t| params.time_at(t) >= arrival).unwrap();

        let mut engine = Engine::new(graph, RelayAssignment::new(), params, nodes[0]).unwrap();
        engine.run(expected_tick + 2).unwrap();

        prop_assert_eq!(
            engine.log().first_tick_with(nodes[1], NodeStatus::Fault),
            Some(expected_tick)
        );
        prop_assert_eq!(
            engine.node_report(nodes[1]).unwrap().fault_arrival,
            Some(params.time_at(expected_tick))
        );
    }
}
