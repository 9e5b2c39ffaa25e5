//! Headless scenario runner for the cascade engine.
//!
//! Loads a scenario (RON, TOML or JSON), resolves it into engine inputs,
//! runs it to its time horizon, and reports or exports the result. The
//! `cascade-sim` binary is a thin argument-parsing shell over this crate.
//!
//! ```rust,ignore
//! let config = load_scenario(Path::new("scenarios/reference.ron"))?;
//! let outcome = execute(config.prepare()?)?;
//! RunSummary::from_outcome(&outcome).print_summary();
//! export(&outcome, Path::new("run.json"))?;
//! ```

pub mod export;
pub mod loader;
pub mod report;
pub mod run;
pub mod scenario;

pub use export::{ExportError, ExportFormat, ExportedRun, export};
pub use loader::{Format, detect_format, load_scenario};
pub use report::{RunSummary, TimelineRow, print_timeline, timeline};
pub use run::{EventTally, RunOutcome, execute};
pub use scenario::{ExplicitTopology, PreparedRun, ScenarioConfig, ScenarioError, TopologySpec};
