//! Post-hoc checks over a finished status log, and run-to-run comparison.
//!
//! The engine already asserts its invariants as it goes. These checks are
//! for consumers that receive a log from elsewhere (a decoded record, a
//! second run) and want to confirm it before trusting it.

use crate::fixed::Ticks;
use crate::id::NodeId;
use crate::log::StatusLog;
use crate::status::NodeStatus;

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A way in which a status log is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("node {node:?} went from {from} to {to} at tick {tick}")]
    StatusRegressed {
        node: NodeId,
        tick: Ticks,
        from: NodeStatus,
        to: NodeStatus,
    },
    #[error("snapshot at index {index} has tick {found}, expected {expected}")]
    TickGap {
        index: usize,
        expected: Ticks,
        found: Ticks,
    },
    #[error("node set changed at tick {tick}")]
    NodeSetChanged { tick: Ticks },
}

/// Check that ticks are contiguous from the first snapshot, every snapshot
/// covers the same nodes, and no node's status ever decreases.
pub fn check_log(log: &StatusLog) -> Result<(), InvariantViolation> {
    let mut snapshots = log.iter();
    let Some(first) = snapshots.next() else {
        return Ok(());
    };

    let mut previous = first;
    for (offset, snap) in snapshots.enumerate() {
        let expected = previous.tick() + 1;
        if snap.tick() != expected {
            return Err(InvariantViolation::TickGap {
                index: offset + 1,
                expected,
                found: snap.tick(),
            });
        }
        if snap.node_count() != previous.node_count() {
            return Err(InvariantViolation::NodeSetChanged { tick: snap.tick() });
        }
        for (node, to) in snap.iter() {
            let Some(from) = previous.status(node) else {
                return Err(InvariantViolation::NodeSetChanged { tick: snap.tick() });
            };
            if to < from {
                return Err(InvariantViolation::StatusRegressed {
                    node,
                    tick: snap.tick(),
                    from,
                    to,
                });
            }
        }
        previous = snap;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Run comparison
// ---------------------------------------------------------------------------

/// First point where two logs disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDivergence {
    /// The logs have different lengths but agree on their common prefix.
    Length { a: usize, b: usize },
    /// Snapshot `index` differs; `node` is the first differing node, if the
    /// difference is in a status rather than in tick or time.
    Snapshot { index: usize, node: Option<NodeId> },
}

/// Compare two logs snapshot by snapshot. `None` means identical.
pub fn diff_logs(a: &StatusLog, b: &StatusLog) -> Option<LogDivergence> {
    for (index, (sa, sb)) in a.iter().zip(b.iter()).enumerate() {
        if sa == sb {
            continue;
        }
        let node = sa
            .iter()
            .find(|&(node, status)| sb.status(node) != Some(status))
            .map(|(node, _)| node);
        return Some(LogDivergence::Snapshot { index, node });
    }
    if a.len() != b.len() {
        return Some(LogDivergence::Length {
            a: a.len(),
            b: b.len(),
        });
    }
    None
}
