//! Scenario file loading with format detection (RON/JSON/TOML).

use crate::scenario::{ScenarioConfig, ScenarioError};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Supported scenario file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ScenarioError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ScenarioError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Deserialize `content` in the given format. `path` is only used for
/// error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, ScenarioError> {
    let parse_error = |detail: String| ScenarioError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, ScenarioError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Load and validate a scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, ScenarioError> {
    let config: ScenarioConfig = deserialize_file(path)?;
    config.validate()?;
    tracing::debug!(file = %path.display(), "scenario loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::TopologySpec;

    const RON: &str = r#"(
        delay_coefficient: 1.0,
        time_step: 0.5,
        max_time: 5.0,
        topology: Explicit((
            nodes: ["A", "B"],
            edges: [("A", "B", 0.5)],
            relays: [("B", 0.2)],
            seed: "A",
        )),
    )"#;

    const TOML: &str = r#"
        delay_coefficient = 1.0
        time_step = 0.5
        max_time = 5.0

        [topology.Explicit]
        nodes = ["A", "B"]
        edges = [["A", "B", 0.5]]
        relays = [["B", 0.2]]
        seed = "A"
    "#;

    const JSON: &str = r#"{
        "delay_coefficient": 1.0,
        "time_step": 0.5,
        "max_time": 5.0,
        "topology": {
            "Explicit": {
                "nodes": ["A", "B"],
                "edges": [["A", "B", 0.5]],
                "relays": [["B", 0.2]],
                "seed": "A"
            }
        }
    }"#;

    #[test]
    fn detect_by_extension() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(ScenarioError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("noext")).is_err());
    }

    #[test]
    fn all_formats_agree() {
        let path = Path::new("inline");
        let ron: ScenarioConfig = deserialize_str(RON, Format::Ron, path).unwrap();
        let toml: ScenarioConfig = deserialize_str(TOML, Format::Toml, path).unwrap();
        let json: ScenarioConfig = deserialize_str(JSON, Format::Json, path).unwrap();
        assert_eq!(ron, toml);
        assert_eq!(ron, json);
        assert!(matches!(ron.topology, TopologySpec::Explicit(_)));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let path = Path::new("inline");
        let config: ScenarioConfig = deserialize_str("{}", Format::Json, path).unwrap();
        assert_eq!(config, ScenarioConfig::default());

        let config: ScenarioConfig = deserialize_str("time_step = 0.25", Format::Toml, path).unwrap();
        assert_eq!(config.time_step, 0.25);
        assert_eq!(config.max_time, 30.0);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = deserialize_str::<ScenarioConfig>("(", Format::Ron, Path::new("broken.ron"))
            .unwrap_err();
        match err {
            ScenarioError::Parse { file, .. } => assert_eq!(file, Path::new("broken.ron")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_scenario(Path::new("/nonexistent/scenario.ron"));
        assert!(matches!(result, Err(ScenarioError::Io(_))));
    }
}
