//! Access to stored base-model predictions and scores.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EnsembleError, Result};

/// Which half of a dataset a prediction array covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Source of precomputed base-model outputs.
pub trait PredictionStore {
    /// Flattened predictions of `model` on one split of `dataset`.
    fn predictions(&self, dataset: &str, model: &str, split: Split) -> Result<Vec<f64>>;

    /// Stored standalone test RMSE of `model` on `dataset`, if recorded.
    fn reference_rmse(&self, dataset: &str, model: &str) -> Result<Option<f64>>;
}

/// Where prediction and score files live.
///
/// Patterns may use the `{dataset}`, `{model}` and `{split}` placeholders and
/// are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub predictions: String,
    pub reference_rmse: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            predictions: "{model}/predictions/{dataset}_{model}_{split}.json".to_string(),
            reference_rmse: Some("{model}/RMSE_{model}.json".to_string()),
        }
    }
}

impl StorageConfig {
    fn resolve(&self, pattern: &str, dataset: &str, model: &str, split: Option<Split>) -> PathBuf {
        let mut relative = pattern.replace("{dataset}", dataset).replace("{model}", model);
        if let Some(split) = split {
            relative = relative.replace("{split}", &split.to_string());
        }
        self.root.join(relative)
    }
}

/// Prediction store reading JSON files.
///
/// Prediction files hold a JSON array of numbers; nested arrays (for example
/// an `N x 1` column) are flattened in order. Score files hold an object
/// mapping dataset name to RMSE.
#[derive(Debug, Clone, Default)]
pub struct JsonPredictionStore {
    config: StorageConfig,
}

impl JsonPredictionStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let file = File::open(path).map_err(|e| EnsembleError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| EnsembleError::parse(path, e))
}

fn flatten_numbers(value: &serde_json::Value, out: &mut Vec<f64>) -> bool {
    match value {
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(x) => {
                out.push(x);
                true
            }
            None => false,
        },
        serde_json::Value::Array(items) => items.iter().all(|item| flatten_numbers(item, out)),
        _ => false,
    }
}

impl PredictionStore for JsonPredictionStore {
    fn predictions(&self, dataset: &str, model: &str, split: Split) -> Result<Vec<f64>> {
        let path = self
            .config
            .resolve(&self.config.predictions, dataset, model, Some(split));
        let json = read_json(&path)?;

        let mut values = Vec::new();
        if !json.is_array() || !flatten_numbers(&json, &mut values) {
            return Err(EnsembleError::parse(
                &path,
                "expected an array of numbers",
            ));
        }
        debug!(path = %path.display(), len = values.len(), "loaded predictions");
        Ok(values)
    }

    fn reference_rmse(&self, dataset: &str, model: &str) -> Result<Option<f64>> {
        let Some(pattern) = &self.config.reference_rmse else {
            return Ok(None);
        };
        let path = self.config.resolve(pattern, dataset, model, None);
        if !path.exists() {
            warn!(path = %path.display(), model, "no stored RMSE file");
            return Ok(None);
        }

        let json = read_json(&path)?;
        let scores = json
            .as_object()
            .ok_or_else(|| EnsembleError::parse(&path, "expected an object keyed by dataset"))?;
        match scores.get(dataset) {
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| EnsembleError::parse(&path, format!("score for '{dataset}' is not a number"))),
            None => {
                warn!(path = %path.display(), model, dataset, "no stored RMSE for dataset");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_in(dir: &Path) -> JsonPredictionStore {
        JsonPredictionStore::new(StorageConfig {
            root: dir.to_path_buf(),
            ..Default::default()
        })
    }

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn resolves_placeholders() {
        let config = StorageConfig::default();
        let path = config.resolve(&config.predictions, "Energy", "LSTM", Some(Split::Test));
        assert_eq!(
            path,
            PathBuf::from("./LSTM/predictions/Energy_LSTM_test.json")
        );
    }

    #[test]
    fn reads_flat_and_nested_arrays() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "LSTM/predictions/Energy_LSTM_train.json", "[1.0, 2.5, 3]");
        write(dir.path(), "LSTM/predictions/Energy_LSTM_test.json", "[[4.0], [5.0]]");
        let store = store_in(dir.path());

        assert_eq!(
            store.predictions("Energy", "LSTM", Split::Train).unwrap(),
            vec![1.0, 2.5, 3.0]
        );
        assert_eq!(
            store.predictions("Energy", "LSTM", Split::Test).unwrap(),
            vec![4.0, 5.0]
        );
    }

    #[test]
    fn non_numeric_predictions_fail_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "X/predictions/D_X_train.json", r#"[1.0, "two"]"#);
        let store = store_in(dir.path());

        assert!(matches!(
            store.predictions("D", "X", Split::Train),
            Err(EnsembleError::Parse { .. })
        ));
    }

    #[test]
    fn missing_prediction_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.predictions("D", "X", Split::Test),
            Err(EnsembleError::Io { .. })
        ));
    }

    #[test]
    fn reference_rmse_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "XGBoost/RMSE_XGBoost.json", r#"{"Energy": 312.5, "Stock": 4.1}"#);
        let store = store_in(dir.path());

        assert_eq!(store.reference_rmse("Energy", "XGBoost").unwrap(), Some(312.5));
        assert_eq!(store.reference_rmse("Traffic", "XGBoost").unwrap(), None);
        assert_eq!(store.reference_rmse("Energy", "LSTM").unwrap(), None);
    }

    #[test]
    fn reference_rmse_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "XGBoost/RMSE_XGBoost.json", r#"{"Energy": 312.5}"#);
        let store = JsonPredictionStore::new(StorageConfig {
            root: dir.path().to_path_buf(),
            reference_rmse: None,
            ..Default::default()
        });
        assert_eq!(store.reference_rmse("Energy", "XGBoost").unwrap(), None);
    }
}
