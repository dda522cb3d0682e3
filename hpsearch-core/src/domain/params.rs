//! Search parameter domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Kind of model the search trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionType {
    #[default]
    Regression,
    Classification,
}

impl PredictionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionType::Regression => "regression",
            PredictionType::Classification => "classification",
        }
    }
}

impl fmt::Display for PredictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyperparameter search configuration
///
/// Loaded from the same JSON file that is handed to the search wrapper.
/// Only the keys the harness needs are typed; everything else is kept in
/// `extra` for the external parameter parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Root of the pipeline checkout holding `utils/hyperparam_search_wrapper.py`
    pub script_dir: PathBuf,

    /// Interpreter used to launch the wrapper
    #[serde(default = "default_python_path")]
    pub python_path: String,

    /// Directory the trained models and their metrics are written to
    pub result_dir: PathBuf,

    #[serde(default)]
    pub prediction_type: PredictionType,

    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

fn default_python_path() -> String {
    "python".to_string()
}

impl SearchParams {
    /// Parses a configuration document
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Path of the search wrapper script inside `script_dir`
    pub fn wrapper_script(&self) -> PathBuf {
        self.script_dir
            .join("utils")
            .join("hyperparam_search_wrapper.py")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_params() {
        let params = SearchParams::from_json_str(
            r#"{"script_dir": "/opt/pipeline", "result_dir": "/scratch/results"}"#,
        )
        .unwrap();

        assert_eq!(params.python_path, "python");
        assert_eq!(params.prediction_type, PredictionType::Regression);
        assert_eq!(params.result_dir, PathBuf::from("/scratch/results"));
        assert!(params.extra.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let params = SearchParams::from_json_str(
            r#"{
                "script_dir": "/opt/pipeline",
                "python_path": "/usr/bin/python3",
                "result_dir": "out",
                "prediction_type": "classification",
                "model_type": "NN",
                "layer_sizes": "256,50"
            }"#,
        )
        .unwrap();

        assert_eq!(params.prediction_type, PredictionType::Classification);
        assert_eq!(params.extra.get("model_type"), Some(&JsonValue::from("NN")));
        assert_eq!(params.extra.len(), 2);
    }

    #[test]
    fn test_missing_result_dir_is_rejected() {
        let result = SearchParams::from_json_str(r#"{"script_dir": "/opt/pipeline"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrapper_script_path() {
        let params =
            SearchParams::from_json_str(r#"{"script_dir": "/opt/ampl", "result_dir": "r"}"#)
                .unwrap();
        assert_eq!(
            params.wrapper_script(),
            PathBuf::from("/opt/ampl/utils/hyperparam_search_wrapper.py")
        );
    }
}
