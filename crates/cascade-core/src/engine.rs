//! The fault propagation engine: owns per-node state and advances it one
//! fixed time step at a time.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A frozen [`NetworkGraph`] and its [`RelayAssignment`]
//! - Per-node [`NodeState`] (status, fault arrival, trip deadline), keyed by `NodeId`
//! - Per-edge propagation delay, computed once at construction
//! - A [`SimState`] (tick counter) and the [`StatusLog`]
//!
//! # Four-Phase Tick
//!
//! Each `step()` at `now = tick * step` runs:
//! 1. **Relay firing** -- faulted nodes whose deadline is due trip
//! 2. **Relay arming** -- protected normal nodes next to a fault start their countdown
//! 3. **Propagation** -- normal nodes whose incoming fault signal has arrived,
//!    and is not held off by an earlier relay deadline, become candidates
//! 4. **Commit** -- candidates enter `Fault`; protected ones re-arm from `now`;
//!    normal nodes whose deadline is due are isolated
//!
//! then appends a [`Snapshot`] and increments the tick counter.
//!
//! Every phase decides against the state left by the previous phase and
//! applies its writes as one batch. In particular propagation only ever sees
//! faults that existed before the tick began, so a fault cannot cross two
//! edges in the same tick.

use crate::event::{TickEvent, TickReport};
use crate::fixed::{Fixed64, Ticks, ticks_for};
use crate::graph::NetworkGraph;
use crate::id::{EdgeId, NodeId};
use crate::log::{Snapshot, StatusLog};
use crate::query::NodeReport;
use crate::relay::RelayAssignment;
use crate::sim::{ConfigError, SimParams, SimState, StateHash};
use crate::status::{NodeState, NodeStatus};
use slotmap::SecondaryMap;
use tracing::{debug, info, trace};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The discrete-time cascade simulation engine.
#[derive(Debug, Clone)]
pub struct Engine {
    graph: NetworkGraph,
    relays: RelayAssignment,
    params: SimParams,
    seed: NodeId,

    sim_state: SimState,

    // -- Per-node state (keyed by NodeId) --
    states: SecondaryMap<NodeId, NodeState>,

    // -- Per-edge state (keyed by EdgeId) --
    /// `length * delay_coefficient`, fixed for the run.
    delays: SecondaryMap<EdgeId, Fixed64>,

    log: StatusLog,
}

/// What propagation evaluation concluded for one normal node.
enum Evaluation {
    /// At least one unblocked fault signal has arrived.
    Candidate(NodeId),
    /// The node stays normal. Carries the signals that arrived this tick but
    /// were held off by the node's relay.
    Held(Vec<TickEvent>),
}

impl Engine {
    /// Build an engine with `seed` in `Fault` at time 0 and every other node
    /// `Normal`. A protected seed is armed at `0 + tau`.
    pub fn new(
        graph: NetworkGraph,
        relays: RelayAssignment,
        params: SimParams,
        seed: NodeId,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        if !graph.contains_node(seed) {
            return Err(ConfigError::UnknownSeed(seed));
        }
        relays.validate(&graph)?;

        let mut states = SecondaryMap::new();
        for node in graph.node_ids() {
            states.insert(node, NodeState::default());
        }

        let mut delays = SecondaryMap::new();
        for (edge, data) in graph.edges() {
            delays.insert(edge, params.delay(data.length));
        }

        let start = Fixed64::ZERO;
        if let Some(seed_state) = states.get_mut(seed) {
            seed_state.enter_fault(start);
            if let Some(tau) = relays.tau(seed) {
                seed_state.arm(start.saturating_add(tau));
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            relays = relays.len(),
            seed = graph.get_node(seed).map(|n| n.label.as_str()).unwrap_or_default(),
            "engine initialized"
        );

        Ok(Self {
            graph,
            relays,
            params,
            seed,
            sim_state: SimState::new(),
            states,
            delays,
            log: StatusLog::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Driving the simulation
    // -----------------------------------------------------------------------

    /// Run exactly `ticks` more ticks and return the log.
    pub fn run(&mut self, ticks: Ticks) -> Result<&StatusLog, ConfigError> {
        if ticks == 0 {
            return Err(ConfigError::NonPositiveTickCount);
        }
        for _ in 0..ticks {
            self.step();
        }

        if let Some(last) = self.log.last() {
            let (normal, fault, tripped) = last.counts();
            info!(
                ticks = self.log.len(),
                normal, fault, tripped, "simulation finished"
            );
        }
        Ok(&self.log)
    }

    /// Run as many ticks as fit in `max_time` (truncated), as a fixed-step
    /// run with a time horizon does.
    pub fn run_until(&mut self, max_time: Fixed64) -> Result<&StatusLog, ConfigError> {
        let ticks = ticks_for(max_time, self.params.time_step);
        self.run(ticks)
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> TickReport {
        let tick = self.sim_state.tick;
        let now = self.params.time_at(tick);
        let mut events = Vec::new();

        // Phase 1: Relay firing.
        self.phase_relay_firing(now, &mut events);

        // Phase 2: Relay arming.
        self.phase_relay_arming(now, &mut events);

        // Phase 3: Propagation evaluation (read-only).
        let candidates = self.phase_propagation(tick, now, &mut events);

        // Phase 4: Commit faults, then isolate.
        self.phase_commit(now, candidates, &mut events);

        // Bookkeeping.
        self.log.push(Snapshot::new(tick, now, self.status_map()));
        self.sim_state.tick += 1;

        TickReport { tick, time: now, events }
    }

    // -----------------------------------------------------------------------
    // Phase 1: Relay firing
    // -----------------------------------------------------------------------

    fn phase_relay_firing(&mut self, now: Fixed64, events: &mut Vec<TickEvent>) {
        let firing: Vec<NodeId> = self
            .states
            .iter()
            .filter(|(_, s)| s.status().is_fault() && s.deadline_due(now))
            .map(|(node, _)| node)
            .collect();

        for node in firing {
            self.states[node].trip();
            debug!(node = ?node, time = %now, "relay tripped");
            events.push(TickEvent::RelayTripped { node, time: now });
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Relay arming
    // -----------------------------------------------------------------------

    fn phase_relay_arming(&mut self, now: Fixed64, events: &mut Vec<TickEvent>) {
        let arming: Vec<(NodeId, Fixed64)> = self
            .states
            .iter()
            .filter(|(_, s)| s.status().is_normal() && s.trip_deadline().is_none())
            .filter_map(|(node, _)| self.relays.tau(node).map(|tau| (node, tau)))
            .filter(|&(node, _)| self.has_fault_neighbor(node))
            .map(|(node, tau)| (node, now.saturating_add(tau)))
            .collect();

        for (node, deadline) in arming {
            self.states[node].arm(deadline);
            debug!(node = ?node, deadline = %deadline, "relay armed");
            events.push(TickEvent::RelayArmed { node, deadline });
        }
    }

    fn has_fault_neighbor(&self, node: NodeId) -> bool {
        self.graph
            .neighbors(node)
            .any(|(neighbor, _)| self.states[neighbor].status().is_fault())
    }

    // -----------------------------------------------------------------------
    // Phase 3: Propagation evaluation
    // -----------------------------------------------------------------------

    /// Collect the nodes that enter `Fault` this tick. Reads only; nothing is
    /// written until [`Self::phase_commit`].
    fn phase_propagation(
        &self,
        tick: Ticks,
        now: Fixed64,
        events: &mut Vec<TickEvent>,
    ) -> Vec<NodeId> {
        let previous = tick.checked_sub(1).map(|t| self.params.time_at(t));
        let normal: Vec<NodeId> = self
            .states
            .iter()
            .filter(|(_, s)| s.status().is_normal())
            .map(|(node, _)| node)
            .collect();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Evaluation> = {
            use rayon::prelude::*;
            normal
                .par_iter()
                .map(|&node| self.evaluate(node, now, previous))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Evaluation> = normal
            .iter()
            .map(|&node| self.evaluate(node, now, previous))
            .collect();

        let mut candidates = Vec::new();
        for outcome in outcomes {
            match outcome {
                Evaluation::Candidate(node) => candidates.push(node),
                Evaluation::Held(blocked) => events.extend(blocked),
            }
        }
        candidates
    }

    /// Decide whether `node` (currently normal) takes a fault at `now`.
    ///
    /// A signal along an edge is blocked when the node's armed deadline is at
    /// or before the signal's arrival: the relay isolates the node first.
    /// Blocking is per edge, so another neighbor can still qualify. Any
    /// qualifying neighbor yields the same outcome (fault at `now`), so the
    /// order neighbors are visited in is not observable.
    fn evaluate(&self, node: NodeId, now: Fixed64, previous: Option<Fixed64>) -> Evaluation {
        let deadline = self.states[node].trip_deadline();
        let mut held = Vec::new();

        for (neighbor, edge) in self.graph.neighbors(node) {
            let Some(fault_since) = self.states[neighbor].active_fault_since() else {
                continue;
            };
            let delay = self.delays.get(edge).copied().unwrap_or(Fixed64::ZERO);
            let arrival = fault_since.saturating_add(delay);

            match deadline {
                Some(deadline) if deadline <= arrival => {
                    // Report the block once, on the tick the signal lands.
                    let lands_now = arrival <= now && previous.is_none_or(|p| arrival > p);
                    if lands_now {
                        trace!(node = ?node, edge = ?edge, arrival = %arrival, deadline = %deadline, "propagation blocked");
                        held.push(TickEvent::PropagationBlocked {
                            node,
                            edge,
                            arrival,
                            deadline,
                        });
                    }
                }
                _ if now >= arrival => return Evaluation::Candidate(node),
                _ => {}
            }
        }
        Evaluation::Held(held)
    }

    // -----------------------------------------------------------------------
    // Phase 4: Commit
    // -----------------------------------------------------------------------

    fn phase_commit(&mut self, now: Fixed64, candidates: Vec<NodeId>, events: &mut Vec<TickEvent>) {
        for node in candidates {
            let state = &mut self.states[node];
            state.enter_fault(now);
            debug!(node = ?node, time = %now, "fault propagated");
            events.push(TickEvent::FaultPropagated { node, time: now });

            if let Some(tau) = self.relays.tau(node) {
                let deadline = now.saturating_add(tau);
                state.rearm(deadline);
                events.push(TickEvent::RelayArmed { node, deadline });
            }
        }

        // A normal node whose relay came due without any fault getting
        // through is isolated. Candidates are already `Fault` at this point.
        let isolating: Vec<NodeId> = self
            .states
            .iter()
            .filter(|(_, s)| s.status().is_normal() && s.deadline_due(now))
            .map(|(node, _)| node)
            .collect();

        for node in isolating {
            self.states[node].trip();
            debug!(node = ?node, time = %now, "node isolated");
            events.push(TickEvent::NodeIsolated { node, time: now });
        }
    }

    fn status_map(&self) -> SecondaryMap<NodeId, NodeStatus> {
        self.states
            .iter()
            .map(|(node, state)| (node, state.status()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn relays(&self) -> &RelayAssignment {
        &self.relays
    }

    pub fn params(&self) -> SimParams {
        self.params
    }

    pub fn seed(&self) -> NodeId {
        self.seed
    }

    /// Index of the next tick to run.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// Simulated time of the next tick to run.
    pub fn current_time(&self) -> Fixed64 {
        self.params.time_at(self.sim_state.tick)
    }

    pub fn log(&self) -> &StatusLog {
        &self.log
    }

    /// Consume the engine, keeping only its log.
    pub fn into_log(self) -> StatusLog {
        self.log
    }

    pub fn status(&self, node: NodeId) -> Option<NodeStatus> {
        self.states.get(node).map(NodeState::status)
    }

    /// A copy of one node's state.
    pub fn node_report(&self, node: NodeId) -> Option<NodeReport> {
        let state = self.states.get(node)?;
        Some(NodeReport {
            id: node,
            status: state.status(),
            fault_arrival: state.fault_arrival(),
            trip_deadline: state.trip_deadline(),
            relay_tau: self.relays.tau(node),
        })
    }

    /// Copies of every node's state, in node order.
    pub fn node_reports(&self) -> Vec<NodeReport> {
        self.graph
            .node_ids()
            .filter_map(|node| self.node_report(node))
            .collect()
    }

    /// Hash of the clock and every node's state. Two engines built from the
    /// same inputs and stepped the same number of times hash identically.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        for (_, state) in &self.states {
            hash.write_u8(state.status() as u8);
            hash.write_opt_fixed64(state.fault_arrival());
            hash.write_opt_fixed64(state.trip_deadline());
        }
        hash.finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
