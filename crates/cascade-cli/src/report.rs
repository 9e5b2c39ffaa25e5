//! Human-readable run summaries.

use crate::run::{EventTally, RunOutcome};
use cascade_core::fixed::{Ticks, fixed64_to_f64};
use cascade_core::status::NodeStatus;

/// Per-tick status counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineRow {
    pub tick: Ticks,
    pub time: f64,
    pub normal: usize,
    pub fault: usize,
    pub tripped: usize,
}

/// Final-state summary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub nodes: usize,
    pub edges: usize,
    pub relays: usize,
    pub seed: String,
    pub ticks: usize,
    pub end_time: f64,
    pub normal: usize,
    pub fault: usize,
    pub tripped: usize,
    /// Nodes that were ever in `Fault`, the seed included.
    pub ever_faulted: usize,
    pub tally: EventTally,
}

impl RunSummary {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let engine = &outcome.engine;
        let graph = engine.graph();
        let log = engine.log();
        let (normal, fault, tripped) = log.last().map(|s| s.counts()).unwrap_or_default();
        let ever_faulted = graph
            .node_ids()
            .filter(|&node| log.ever(node, NodeStatus::Fault))
            .count();

        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            relays: engine.relays().len(),
            seed: graph
                .get_node(engine.seed())
                .map(|n| n.label.clone())
                .unwrap_or_default(),
            ticks: log.len(),
            end_time: log.last().map(|s| fixed64_to_f64(s.time())).unwrap_or(0.0),
            normal,
            fault,
            tripped,
            ever_faulted,
            tally: outcome.tally,
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Cascade Run ===");
        println!(
            "Network: {} nodes, {} edges, {} relays",
            self.nodes, self.edges, self.relays
        );
        println!("Seed fault: {}", self.seed);
        println!("Ticks: {} (last at t = {:.2})", self.ticks, self.end_time);
        println!();
        println!("Final state:");
        println!("  normal:  {}", self.normal);
        println!("  fault:   {}", self.fault);
        println!("  tripped: {}", self.tripped);
        println!();
        println!("Transitions:");
        println!("  faults propagated:   {}", self.tally.faulted);
        println!("  relays armed:        {}", self.tally.armed);
        println!("  relays tripped:      {}", self.tally.tripped);
        println!("  nodes isolated:      {}", self.tally.isolated);
        println!("  signals blocked:     {}", self.tally.blocked);
        println!("  nodes ever faulted:  {}", self.ever_faulted);
        match self.tally.last_fault_time {
            Some(t) => println!("  last propagation at t = {:.2}", fixed64_to_f64(t)),
            None => println!("  fault never left the seed"),
        }
    }
}

/// One row per snapshot.
pub fn timeline(outcome: &RunOutcome) -> Vec<TimelineRow> {
    outcome
        .engine
        .log()
        .iter()
        .map(|snap| {
            let (normal, fault, tripped) = snap.counts();
            TimelineRow {
                tick: snap.tick(),
                time: fixed64_to_f64(snap.time()),
                normal,
                fault,
                tripped,
            }
        })
        .collect()
}

pub fn print_timeline(rows: &[TimelineRow]) {
    println!("\n{:>6} {:>8} {:>7} {:>7} {:>8}", "tick", "time", "normal", "fault", "tripped");
    for row in rows {
        println!(
            "{:>6} {:>8.2} {:>7} {:>7} {:>8}",
            row.tick, row.time, row.normal, row.fault, row.tripped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::execute;
    use crate::scenario::{ExplicitTopology, ScenarioConfig, TopologySpec};

    fn outcome() -> RunOutcome {
        let config = ScenarioConfig {
            delay_coefficient: 2.0,
            time_step: 0.5,
            max_time: 6.0,
            topology: TopologySpec::Explicit(ExplicitTopology {
                nodes: vec!["A".into(), "B".into(), "C".into()],
                edges: vec![("A".into(), "B".into(), 1.0), ("B".into(), "C".into(), 1.0)],
                relays: vec![("B".into(), 3.0)],
                seed: "A".into(),
            }),
        };
        execute(config.prepare().unwrap()).unwrap()
    }

    #[test]
    fn summary_counts_final_state() {
        // B is armed at t = 0 (deadline 3.0), the signal lands at 2.0, so B
        // faults, re-arms to 5.0 and trips at t = 5.0. C faults at 4.0.
        let summary = RunSummary::from_outcome(&outcome());
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.relays, 1);
        assert_eq!(summary.seed, "A");
        assert_eq!(summary.ticks, 12);
        assert_eq!(summary.end_time, 5.5);
        assert_eq!((summary.normal, summary.fault, summary.tripped), (0, 2, 1));
        assert_eq!(summary.ever_faulted, 3);
        assert_eq!(summary.tally.faulted, 2);
        assert_eq!(summary.tally.tripped, 1);
    }

    #[test]
    fn timeline_has_a_row_per_tick() {
        let rows = timeline(&outcome());
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].fault, 1);
        assert_eq!(rows[4].fault, 2);
        assert_eq!(rows[10].tripped, 1);
        for row in &rows {
            assert_eq!(row.normal + row.fault + row.tripped, 3);
        }
    }
}
