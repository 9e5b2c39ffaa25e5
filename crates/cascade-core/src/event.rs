//! Transition events produced by a single tick.
//!
//! Events fire only on transitions, never as a per-tick status echo. They are
//! returned to the caller with the tick's [`TickReport`]; the engine keeps no
//! event history of its own (the [`StatusLog`](crate::log::StatusLog) is the
//! durable record).

use crate::fixed::{Fixed64, Ticks};
use crate::id::{EdgeId, NodeId};

/// A transition observed while advancing one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// A relay started its countdown.
    RelayArmed { node: NodeId, deadline: Fixed64 },
    /// A faulted node's relay fired.
    RelayTripped { node: NodeId, time: Fixed64 },
    /// A normal node's relay fired before any fault reached it.
    NodeIsolated { node: NodeId, time: Fixed64 },
    /// A fault signal took effect on `node`.
    FaultPropagated { node: NodeId, time: Fixed64 },
    /// The fault signal along `edge` was held off by the node's armed relay.
    PropagationBlocked {
        node: NodeId,
        edge: EdgeId,
        arrival: Fixed64,
        deadline: Fixed64,
    },
}

impl TickEvent {
    /// The node the event concerns.
    pub fn node(&self) -> NodeId {
        match *self {
            TickEvent::RelayArmed { node, .. }
            | TickEvent::RelayTripped { node, .. }
            | TickEvent::NodeIsolated { node, .. }
            | TickEvent::FaultPropagated { node, .. }
            | TickEvent::PropagationBlocked { node, .. } => node,
        }
    }
}

/// Outcome of one call to [`Engine::step`](crate::engine::Engine::step).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick index that was just executed.
    pub tick: Ticks,
    /// Simulated time of that tick.
    pub time: Fixed64,
    /// Transitions in the order the sub-steps produced them.
    pub events: Vec<TickEvent>,
}

impl TickReport {
    pub fn faulted(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TickEvent::FaultPropagated { node, .. } => Some(*node),
            _ => None,
        })
    }

    pub fn tripped(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TickEvent::RelayTripped { node, .. } | TickEvent::NodeIsolated { node, .. } => {
                Some(*node)
            }
            _ => None,
        })
    }

    pub fn armed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TickEvent::RelayArmed { node, .. } => Some(*node),
            _ => None,
        })
    }

    /// Whether the tick changed any node's status.
    pub fn changed_status(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e,
                TickEvent::RelayTripped { .. }
                    | TickEvent::NodeIsolated { .. }
                    | TickEvent::FaultPropagated { .. }
            )
        })
    }
}
