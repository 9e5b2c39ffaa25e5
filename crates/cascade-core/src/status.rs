//! Per-node status and the engine-owned mutable record behind it.
//!
//! [`NodeState`] is only ever mutated through its transition methods, and
//! each of them asserts the transition is legal. A failed assertion means
//! the engine itself is wrong: continuing would corrupt the status log, so
//! these are hard panics rather than recoverable errors.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

/// Operating status of a node. Ordered: a node's status never decreases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum NodeStatus {
    #[default]
    Normal,
    Fault,
    Tripped,
}

impl NodeStatus {
    pub fn is_normal(self) -> bool {
        self == NodeStatus::Normal
    }

    pub fn is_fault(self) -> bool {
        self == NodeStatus::Fault
    }

    pub fn is_tripped(self) -> bool {
        self == NodeStatus::Tripped
    }

    /// Short lowercase name, as used in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Normal => "normal",
            NodeStatus::Fault => "fault",
            NodeStatus::Tripped => "tripped",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable per-node record owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    status: NodeStatus,
    /// Set exactly once, when the node enters `Fault`.
    fault_arrival: Option<Fixed64>,
    /// Armed trip deadline, if any.
    trip_deadline: Option<Fixed64>,
}

impl NodeState {
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn fault_arrival(&self) -> Option<Fixed64> {
        self.fault_arrival
    }

    pub fn trip_deadline(&self) -> Option<Fixed64> {
        self.trip_deadline
    }

    /// Arrival time of the fault this node is currently propagating. `None`
    /// unless the node is in `Fault`.
    pub fn active_fault_since(&self) -> Option<Fixed64> {
        if self.status.is_fault() {
            self.fault_arrival
        } else {
            None
        }
    }

    /// Whether an armed deadline has come due at `now`.
    pub fn deadline_due(&self, now: Fixed64) -> bool {
        self.trip_deadline.is_some_and(|d| d <= now)
    }

    /// Normal -> Fault at `time`. Panics if the node is not Normal or
    /// already carries an arrival time.
    pub(crate) fn enter_fault(&mut self, time: Fixed64) {
        assert!(
            self.status.is_normal(),
            "illegal transition {} -> fault",
            self.status
        );
        assert!(
            self.fault_arrival.is_none(),
            "fault arrival written twice (was {:?})",
            self.fault_arrival
        );
        self.status = NodeStatus::Fault;
        self.fault_arrival = Some(time);
    }

    /// Fault -> Tripped, or Normal -> Tripped when the node is isolated
    /// before any fault reaches it. Clears the armed deadline.
    pub(crate) fn trip(&mut self) {
        assert!(
            !self.status.is_tripped(),
            "illegal transition tripped -> tripped"
        );
        self.status = NodeStatus::Tripped;
        self.trip_deadline = None;
    }

    /// Arm a trip deadline. Only allowed while no deadline is armed.
    pub(crate) fn arm(&mut self, deadline: Fixed64) {
        assert!(
            self.trip_deadline.is_none(),
            "relay re-armed while a deadline is pending"
        );
        self.trip_deadline = Some(deadline);
    }

    /// Replace any pending deadline. Used only when a node enters `Fault`,
    /// where the relay restarts from the moment of the fault.
    pub(crate) fn rearm(&mut self, deadline: Fixed64) {
        self.trip_deadline = Some(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    #[test]
    fn status_ordering_is_monotonic_order() {
        assert!(NodeStatus::Normal < NodeStatus::Fault);
        assert!(NodeStatus::Fault < NodeStatus::Tripped);
    }

    #[test]
    fn normal_fault_tripped() {
        let mut state = NodeState::default();
        state.enter_fault(fixed(1.5));
        state.rearm(fixed(2.0));
        assert_eq!(state.status(), NodeStatus::Fault);
        assert_eq!(state.fault_arrival(), Some(fixed(1.5)));
        assert_eq!(state.trip_deadline(), Some(fixed(2.0)));

        state.trip();
        assert_eq!(state.status(), NodeStatus::Tripped);
        assert_eq!(state.trip_deadline(), None);
        assert_eq!(state.fault_arrival(), Some(fixed(1.5)));
    }

    #[test]
    fn normal_can_be_isolated() {
        let mut state = NodeState::default();
        state.arm(fixed(0.2));
        state.trip();
        assert_eq!(state.status(), NodeStatus::Tripped);
        assert_eq!(state.fault_arrival(), None);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn second_fault_write_panics() {
        let mut state = NodeState::default();
        state.enter_fault(fixed(0.0));
        state.enter_fault(fixed(0.5));
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn tripped_cannot_fault() {
        let mut state = NodeState::default();
        state.trip();
        state.enter_fault(fixed(0.5));
    }

    #[test]
    #[should_panic(expected = "re-armed")]
    fn arm_twice_panics() {
        let mut state = NodeState::default();
        state.arm(fixed(0.5));
        state.arm(fixed(1.0));
    }

    #[test]
    fn display_names() {
        assert_eq!(NodeStatus::Normal.to_string(), "normal");
        assert_eq!(NodeStatus::Fault.to_string(), "fault");
        assert_eq!(NodeStatus::Tripped.to_string(), "tripped");
    }
}
