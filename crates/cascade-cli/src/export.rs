//! Write a finished run to disk for an external renderer.
//!
//! `.json` produces a label-keyed document (graph, relays, optional layout
//! and every snapshot). `.bin` produces a [`RunRecord`] blob.

use crate::run::RunOutcome;
use cascade_core::fixed::fixed64_to_f64;
use cascade_core::id::NodeId;
use cascade_core::serialize::{RunRecord, SerializeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors raised while exporting a run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unsupported export format for file: {file} (use .json or .bin)")]
    UnsupportedFormat { file: PathBuf },
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Encode(#[from] SerializeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Export formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Binary,
}

pub fn detect_export_format(path: &Path) -> Result<ExportFormat, ExportError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(ExportFormat::Json),
        Some("bin") => Ok(ExportFormat::Binary),
        _ => Err(ExportError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// JSON document
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEdge {
    pub a: String,
    pub b: String,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSnapshot {
    pub tick: u64,
    pub time: f64,
    /// Label to `"normal"`, `"fault"` or `"tripped"`.
    pub statuses: BTreeMap<String, String>,
}

/// Label-keyed view of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRun {
    pub delay_coefficient: f64,
    pub time_step: f64,
    pub seed: String,
    pub nodes: Vec<String>,
    pub edges: Vec<ExportedEdge>,
    pub relays: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<BTreeMap<String, [f64; 2]>>,
    pub snapshots: Vec<ExportedSnapshot>,
}

impl ExportedRun {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let engine = &outcome.engine;
        let graph = engine.graph();
        let label = |node: NodeId| {
            graph
                .get_node(node)
                .map(|n| n.label.clone())
                .unwrap_or_default()
        };

        let edges = graph
            .edges()
            .map(|(_, e)| ExportedEdge {
                a: label(e.a),
                b: label(e.b),
                length: fixed64_to_f64(e.length),
            })
            .collect();
        let relays = engine
            .relays()
            .iter()
            .map(|(node, relay)| (label(node), fixed64_to_f64(relay.tau)))
            .collect();
        let positions = outcome.positions.as_ref().map(|positions| {
            positions
                .iter()
                .map(|(node, p)| (label(node), [p.x, p.y]))
                .collect()
        });
        let snapshots = engine
            .log()
            .iter()
            .map(|snap| ExportedSnapshot {
                tick: snap.tick(),
                time: fixed64_to_f64(snap.time()),
                statuses: snap
                    .iter()
                    .map(|(node, status)| (label(node), status.as_str().to_string()))
                    .collect(),
            })
            .collect();

        let params = engine.params();
        Self {
            delay_coefficient: fixed64_to_f64(params.delay_coefficient),
            time_step: fixed64_to_f64(params.time_step),
            seed: label(engine.seed()),
            nodes: graph.nodes().map(|(_, n)| n.label.clone()).collect(),
            edges,
            relays,
            positions,
            snapshots,
        }
    }
}

/// Write `outcome` to `path` in the format its extension names.
pub fn export(outcome: &RunOutcome, path: &Path) -> Result<ExportFormat, ExportError> {
    let format = detect_export_format(path)?;
    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(&ExportedRun::from_outcome(outcome))?,
        ExportFormat::Binary => outcome.engine.record().encode()?,
    };
    std::fs::write(path, bytes)?;
    tracing::info!(file = %path.display(), ?format, "run exported");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::execute;
    use crate::scenario::{ExplicitTopology, ScenarioConfig, TopologySpec};

    fn path_outcome() -> RunOutcome {
        let config = ScenarioConfig {
            delay_coefficient: 2.0,
            time_step: 0.5,
            max_time: 5.0,
            topology: TopologySpec::Explicit(ExplicitTopology {
                nodes: vec!["A".into(), "B".into(), "C".into()],
                edges: vec![("A".into(), "B".into(), 1.0), ("B".into(), "C".into(), 1.0)],
                relays: vec![],
                seed: "A".into(),
            }),
        };
        execute(config.prepare().unwrap()).unwrap()
    }

    #[test]
    fn export_format_by_extension() {
        assert_eq!(
            detect_export_format(Path::new("out.json")).unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            detect_export_format(Path::new("out.bin")).unwrap(),
            ExportFormat::Binary
        );
        assert!(detect_export_format(Path::new("out.csv")).is_err());
    }

    #[test]
    fn json_document_is_label_keyed() {
        let doc = ExportedRun::from_outcome(&path_outcome());
        assert_eq!(doc.seed, "A");
        assert_eq!(doc.nodes, vec!["A", "B", "C"]);
        assert_eq!(doc.edges.len(), 2);
        assert_eq!(doc.snapshots.len(), 10);
        assert!(doc.positions.is_none());

        assert_eq!(doc.snapshots[3].statuses["B"], "normal");
        assert_eq!(doc.snapshots[4].statuses["B"], "fault");
        assert_eq!(doc.snapshots[4].time, 2.0);
        assert_eq!(doc.snapshots[8].statuses["C"], "fault");
    }

    #[test]
    fn files_are_written_and_readable() {
        let outcome = path_outcome();
        let dir = std::env::temp_dir().join(format!("cascade-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("run.json");
        assert_eq!(export(&outcome, &json_path).unwrap(), ExportFormat::Json);
        let text = std::fs::read_to_string(&json_path).unwrap();
        let doc: ExportedRun = serde_json::from_str(&text).unwrap();
        assert_eq!(doc, ExportedRun::from_outcome(&outcome));

        let bin_path = dir.join("run.bin");
        assert_eq!(export(&outcome, &bin_path).unwrap(), ExportFormat::Binary);
        let record = RunRecord::decode(&std::fs::read(&bin_path).unwrap()).unwrap();
        assert_eq!(&record.log, outcome.engine.log());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
