//! Read-only status snapshots and the append-only log that collects them.
//!
//! The engine appends exactly one [`Snapshot`] per tick. Consumers (the CLI
//! report, exporters, tests) only ever see these copies, never the engine's
//! live per-node records.

use crate::fixed::{Fixed64, Ticks};
use crate::id::NodeId;
use crate::status::NodeStatus;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Status of every node at the end of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    tick: Ticks,
    time: Fixed64,
    statuses: SecondaryMap<NodeId, NodeStatus>,
}

impl Snapshot {
    pub(crate) fn new(tick: Ticks, time: Fixed64, statuses: SecondaryMap<NodeId, NodeStatus>) -> Self {
        Self {
            tick,
            time,
            statuses,
        }
    }

    /// Tick index this snapshot was taken at.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Simulated time of the tick (`tick * step`).
    pub fn time(&self) -> Fixed64 {
        self.time
    }

    pub fn status(&self, node: NodeId) -> Option<NodeStatus> {
        self.statuses.get(node).copied()
    }

    /// All node statuses, in node insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeStatus)> + '_ {
        self.statuses.iter().map(|(node, status)| (node, *status))
    }

    pub fn node_count(&self) -> usize {
        self.statuses.len()
    }

    /// Number of nodes currently in `status`.
    pub fn count(&self, status: NodeStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    /// Counts as `(normal, fault, tripped)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.statuses
            .values()
            .fold((0, 0, 0), |(n, f, t), status| match status {
                NodeStatus::Normal => (n + 1, f, t),
                NodeStatus::Fault => (n, f + 1, t),
                NodeStatus::Tripped => (n, f, t + 1),
            })
    }
}

// ---------------------------------------------------------------------------
// StatusLog
// ---------------------------------------------------------------------------

/// Ordered, append-only sequence of snapshots, one per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLog {
    snapshots: Vec<Snapshot>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        debug_assert!(
            self.snapshots
                .last()
                .is_none_or(|last| last.tick() < snapshot.tick()),
            "snapshots must be appended in tick order"
        );
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Status of `node` in every snapshot, in order.
    pub fn history(&self, node: NodeId) -> impl Iterator<Item = Option<NodeStatus>> + '_ {
        self.snapshots.iter().map(move |s| s.status(node))
    }

    /// First tick at which `node` is observed in `status`.
    pub fn first_tick_with(&self, node: NodeId, status: NodeStatus) -> Option<Ticks> {
        self.snapshots
            .iter()
            .find(|s| s.status(node) == Some(status))
            .map(Snapshot::tick)
    }

    /// Whether `node` is ever observed in `status`.
    pub fn ever(&self, node: NodeId, status: NodeStatus) -> bool {
        self.first_tick_with(node, status).is_some()
    }
}
