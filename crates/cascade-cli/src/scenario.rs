//! Scenario description and its conversion into engine inputs.
//!
//! A scenario names the simulation parameters and either a generated
//! topology or an explicit list of labelled nodes, edges and relays.
//! Every field has a default, so an empty file runs the reference setup.

use cascade_core::engine::Engine;
use cascade_core::fixed::{Ticks, f64_to_fixed64, ticks_for};
use cascade_core::graph::{GraphError, NetworkGraph};
use cascade_core::id::NodeId;
use cascade_core::relay::{RelayAssignment, RelayError};
use cascade_core::sim::{ConfigError, SimParams};
use cascade_topology::{Position, TopologyConfig, TopologyError, generate};
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors raised while loading or building a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("node label '{0}' is used more than once")]
    DuplicateLabel(String),

    #[error("unknown node label '{0}'")]
    UnknownLabel(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Scenario file schema
// ===========================================================================

/// Top-level scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Propagation delay per unit of edge length.
    pub delay_coefficient: f64,
    /// Duration of one tick.
    pub time_step: f64,
    /// Simulated horizon; the run covers `max_time / time_step` ticks,
    /// truncated.
    pub max_time: f64,
    pub topology: TopologySpec,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            delay_coefficient: 2.0,
            time_step: 0.5,
            max_time: 30.0,
            topology: TopologySpec::default(),
        }
    }
}

/// Where the network comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopologySpec {
    Generated(TopologyConfig),
    Explicit(ExplicitTopology),
}

impl Default for TopologySpec {
    fn default() -> Self {
        TopologySpec::Generated(TopologyConfig::default())
    }
}

/// A hand-written network, addressed by node label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExplicitTopology {
    pub nodes: Vec<String>,
    /// `(from, to, length)`.
    pub edges: Vec<(String, String, f64)>,
    /// `(node, tau)`.
    #[serde(default)]
    pub relays: Vec<(String, f64)>,
    /// Label of the initially faulted node.
    pub seed: String,
}

// ===========================================================================
// Building
// ===========================================================================

/// Engine inputs resolved from a scenario, plus the layout when the
/// network was generated.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub graph: NetworkGraph,
    pub relays: RelayAssignment,
    pub seed: NodeId,
    pub params: SimParams,
    pub ticks: Ticks,
    pub positions: Option<SecondaryMap<NodeId, Position>>,
}

impl PreparedRun {
    /// Construct the engine. Positions are not needed by the engine and
    /// are dropped.
    pub fn into_engine(self) -> Result<Engine, ConfigError> {
        Engine::new(self.graph, self.relays, self.params, self.seed)
    }
}

impl ScenarioConfig {
    /// Reject values that have no fixed-point representation.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut fields = vec![
            ("delay_coefficient", self.delay_coefficient),
            ("time_step", self.time_step),
            ("max_time", self.max_time),
        ];
        if let TopologySpec::Explicit(explicit) = &self.topology {
            fields.extend(explicit.edges.iter().map(|e| ("edge length", e.2)));
            fields.extend(explicit.relays.iter().map(|r| ("relay tau", r.1)));
        }
        match fields.into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(ScenarioError::NonFinite { field, value }),
            None => Ok(()),
        }
    }

    pub fn params(&self) -> SimParams {
        SimParams::new(
            f64_to_fixed64(self.delay_coefficient),
            f64_to_fixed64(self.time_step),
        )
    }

    /// Number of ticks the run covers.
    pub fn ticks(&self) -> Ticks {
        ticks_for(f64_to_fixed64(self.max_time), f64_to_fixed64(self.time_step))
    }

    /// Resolve the topology into engine inputs.
    pub fn prepare(&self) -> Result<PreparedRun, ScenarioError> {
        self.validate()?;
        let params = self.params();
        params.validate()?;
        let ticks = self.ticks();

        match &self.topology {
            TopologySpec::Generated(config) => {
                let net = generate(config)?;
                Ok(PreparedRun {
                    graph: net.graph,
                    relays: net.relays,
                    seed: net.seed,
                    params,
                    ticks,
                    positions: Some(net.positions),
                })
            }
            TopologySpec::Explicit(explicit) => {
                let (graph, relays, seed) = explicit.build()?;
                Ok(PreparedRun {
                    graph,
                    relays,
                    seed,
                    params,
                    ticks,
                    positions: None,
                })
            }
        }
    }
}

impl ExplicitTopology {
    /// Build the graph and relay assignment, resolving labels.
    pub fn build(&self) -> Result<(NetworkGraph, RelayAssignment, NodeId), ScenarioError> {
        let mut graph = NetworkGraph::new();
        let mut seen = BTreeSet::new();
        for label in &self.nodes {
            if !seen.insert(label.as_str()) {
                return Err(ScenarioError::DuplicateLabel(label.clone()));
            }
            graph.add_node(label.clone());
        }

        let lookup = |graph: &NetworkGraph, label: &str| {
            graph
                .node_by_label(label)
                .ok_or_else(|| ScenarioError::UnknownLabel(label.to_string()))
        };

        for (from, to, length) in &self.edges {
            let a = lookup(&graph, from)?;
            let b = lookup(&graph, to)?;
            graph.connect(a, b, f64_to_fixed64(*length))?;
        }

        let mut relays = RelayAssignment::new();
        for (label, tau) in &self.relays {
            let node = lookup(&graph, label)?;
            relays.assign(node, f64_to_fixed64(*tau))?;
        }

        let seed = lookup(&graph, &self.seed)?;
        Ok((graph, relays, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::fixed::Fixed64;

    fn abc() -> ExplicitTopology {
        ExplicitTopology {
            nodes: vec!["A".into(), "B".into(), "C".into()],
            edges: vec![("A".into(), "B".into(), 1.0), ("B".into(), "C".into(), 1.0)],
            relays: vec![("C".into(), 0.5)],
            seed: "A".into(),
        }
    }

    #[test]
    fn defaults_are_reference_parameters() {
        let config = ScenarioConfig::default();
        assert_eq!(config.ticks(), 60);
        assert_eq!(config.params().delay_coefficient, Fixed64::from_num(2));
        assert!(matches!(config.topology, TopologySpec::Generated(_)));
    }

    #[test]
    fn explicit_topology_resolves_labels() {
        let (graph, relays, seed) = abc().build().unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.get_node(seed).unwrap().label, "A");
        let c = graph.node_by_label("C").unwrap();
        assert_eq!(relays.tau(c), Some(f64_to_fixed64(0.5)));
    }

    #[test]
    fn unknown_label_is_an_error() {
        let mut topo = abc();
        topo.edges.push(("A".into(), "Z".into(), 1.0));
        assert!(matches!(topo.build(), Err(ScenarioError::UnknownLabel(l)) if l == "Z"));

        let mut topo = abc();
        topo.seed = "Q".into();
        assert!(matches!(topo.build(), Err(ScenarioError::UnknownLabel(l)) if l == "Q"));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut topo = abc();
        topo.nodes.push("B".into());
        assert!(matches!(topo.build(), Err(ScenarioError::DuplicateLabel(l)) if l == "B"));
    }

    #[test]
    fn bad_edges_and_relays_surface_core_errors() {
        let mut topo = abc();
        topo.edges.push(("A".into(), "A".into(), 1.0));
        assert!(matches!(topo.build(), Err(ScenarioError::Graph(GraphError::SelfLoop(_)))));

        let mut topo = abc();
        topo.relays.push(("B".into(), -1.0));
        assert!(matches!(
            topo.build(),
            Err(ScenarioError::Relay(RelayError::NegativeTau { .. }))
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let config = ScenarioConfig {
            time_step: f64::NAN,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            config.prepare(),
            Err(ScenarioError::NonFinite { field: "time_step", .. })
        ));
    }

    #[test]
    fn non_positive_step_is_a_config_error() {
        let config = ScenarioConfig {
            time_step: 0.0,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            config.prepare(),
            Err(ScenarioError::Config(ConfigError::NonPositiveTimeStep(_)))
        ));
    }

    #[test]
    fn generated_scenario_carries_positions() {
        let run = ScenarioConfig::default().prepare().unwrap();
        assert_eq!(run.graph.node_count(), 50);
        assert_eq!(run.positions.map(|p| p.len()), Some(50));
        assert_eq!(run.ticks, 60);
    }
}
