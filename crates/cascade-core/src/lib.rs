//! Cascade Core -- discrete-time fault propagation on infrastructure graphs.
//!
//! This crate models how a fault spreads across an undirected network with
//! distance-dependent signal delay, and how protective relays isolate nodes
//! before the signal reaches them. Time advances in fixed steps; all time
//! arithmetic is deterministic fixed-point.
//!
//! # Four-Phase Tick
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one tick
//! at `now = tick * step`:
//!
//! 1. **Relay firing** -- faulted nodes whose relay deadline is due trip.
//! 2. **Relay arming** -- protected normal nodes adjacent to a fault start
//!    their countdown (once; an armed relay is never re-armed).
//! 3. **Propagation** -- normal nodes whose incoming fault signal has
//!    arrived become faulted, unless their relay deadline is at or before
//!    that arrival.
//! 4. **Commit** -- new faults are applied together; protected ones re-arm
//!    from the fault time; relays that came due on normal nodes isolate them.
//!
//! A snapshot of every node's status is then appended to the
//! [`log::StatusLog`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut graph = NetworkGraph::new();
//! let a = graph.add_node("A");
//! let b = graph.add_node("B");
//! graph.connect(a, b, f64_to_fixed64(0.5))?;
//!
//! let mut relays = RelayAssignment::new();
//! relays.assign(b, f64_to_fixed64(0.2))?;
//!
//! let params = SimParams::new(f64_to_fixed64(2.0), f64_to_fixed64(0.5));
//! let mut engine = Engine::new(graph, relays, params, a)?;
//! let log = engine.run(60)?;
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns per-node state and runs the tick pipeline.
//! - [`graph::NetworkGraph`] -- Undirected graph with length-weighted edges.
//! - [`relay::RelayAssignment`] -- Node to relay time constant mapping.
//! - [`log::StatusLog`] -- Append-only per-tick status snapshots.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic time.
//! - [`serialize::RunRecord`] -- Versioned binary export of a finished run.

pub mod engine;
pub mod event;
pub mod fixed;
pub mod graph;
pub mod id;
pub mod log;
pub mod query;
pub mod relay;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod status;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
