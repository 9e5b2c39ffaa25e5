//! Drive a prepared scenario to completion and tally what happened.

use crate::scenario::{PreparedRun, ScenarioError};
use cascade_core::engine::Engine;
use cascade_core::event::{TickEvent, TickReport};
use cascade_core::fixed::{Fixed64, Ticks};
use cascade_core::id::NodeId;
use cascade_core::sim::ConfigError;
use cascade_topology::Position;
use slotmap::SecondaryMap;

/// Transition counts accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub armed: usize,
    pub faulted: usize,
    pub tripped: usize,
    pub isolated: usize,
    pub blocked: usize,
    /// Tick of the most recent fault propagation.
    pub last_fault_tick: Option<Ticks>,
    pub last_fault_time: Option<Fixed64>,
}

impl EventTally {
    pub fn record(&mut self, report: &TickReport) {
        for event in &report.events {
            match event {
                TickEvent::RelayArmed { .. } => self.armed += 1,
                TickEvent::RelayTripped { .. } => self.tripped += 1,
                TickEvent::NodeIsolated { .. } => self.isolated += 1,
                TickEvent::PropagationBlocked { .. } => self.blocked += 1,
                TickEvent::FaultPropagated { .. } => {
                    self.faulted += 1;
                    self.last_fault_tick = Some(report.tick);
                    self.last_fault_time = Some(report.time);
                }
            }
        }
    }
}

/// A finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub engine: Engine,
    pub tally: EventTally,
    pub positions: Option<SecondaryMap<NodeId, Position>>,
}

/// Build the engine and advance it through every tick of the run.
pub fn execute(run: PreparedRun) -> Result<RunOutcome, ScenarioError> {
    let ticks = run.ticks;
    if ticks == 0 {
        return Err(ConfigError::NonPositiveTickCount.into());
    }
    let positions = run.positions.clone();
    let mut engine = run.into_engine()?;

    let mut tally = EventTally::default();
    for _ in 0..ticks {
        let report = engine.step();
        tally.record(&report);
    }

    if let Some(last) = engine.log().last() {
        let (normal, fault, tripped) = last.counts();
        tracing::info!(
            ticks = engine.log().len(),
            normal,
            fault,
            tripped,
            blocked = tally.blocked,
            "run complete"
        );
    }

    Ok(RunOutcome {
        engine,
        tally,
        positions,
    })
}
