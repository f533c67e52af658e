//! Configuration-driven registry of datasets and base models.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::dataset::DatasetSpec;
use super::store::StorageConfig;
use crate::error::{EnsembleError, Result};
use crate::pipeline::PipelineConfig;

/// A base model whose predictions are available in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Datasets, models, storage layout and pipeline defaults, read from TOML.
///
/// # Example
/// ```
/// use caruana_forecast::data::Registry;
///
/// let registry = Registry::from_toml_str(r#"
///     [pipeline]
///     trials = 20
///
///     [[datasets]]
///     name = "Weather"
///     path = "datasets/jena_climate.csv"
///     target_column = "Tpot (K)"
///     slice = { kind = "stride", step = 144 }
///
///     [[models]]
///     name = "LSTM"
/// "#).unwrap();
///
/// assert_eq!(registry.pipeline.search.trials, 20);
/// assert!(registry.dataset("Weather").is_ok());
/// assert!(registry.check_model("XGBoost").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
    /// Known models; an empty list accepts any model name.
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl Registry {
    /// Parse a registry from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let registry: Registry =
            toml::from_str(text).map_err(|e| EnsembleError::Config(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }

    /// Read a registry file.
    ///
    /// A relative storage root is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EnsembleError::io(path, e))?;
        let mut registry = Self::from_toml_str(&text)?;

        if registry.storage.root.is_relative() {
            if let Some(dir) = path.parent() {
                registry.storage.root = dir.join(&registry.storage.root);
            }
        }
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.name.as_str()) {
                return Err(EnsembleError::Config(format!(
                    "dataset '{}' is registered twice",
                    dataset.name
                )));
            }
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(EnsembleError::Config(format!(
                    "model '{}' is registered twice",
                    model.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a dataset by name.
    pub fn dataset(&self, name: &str) -> Result<&DatasetSpec> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| EnsembleError::UnknownDataset(name.to_string()))
    }

    /// Check that `name` is a registered model.
    pub fn check_model(&self, name: &str) -> Result<()> {
        if self.models.is_empty() || self.models.iter().any(|m| m.name == name) {
            Ok(())
        } else {
            Err(EnsembleError::UnknownModel(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SliceRule;

    #[test]
    fn empty_registry_uses_defaults() {
        let registry = Registry::from_toml_str("").unwrap();
        assert_eq!(registry, Registry::default());
        assert!(registry.check_model("anything").is_ok());
    }

    #[test]
    fn unknown_dataset() {
        let registry = Registry::from_toml_str("").unwrap();
        assert_eq!(
            registry.dataset("Energy").err(),
            Some(EnsembleError::UnknownDataset("Energy".into()))
        );
    }

    #[test]
    fn duplicate_dataset_is_rejected() {
        let text = r#"
            [[datasets]]
            name = "A"
            path = "a.csv"
            target_column = "y"

            [[datasets]]
            name = "A"
            path = "b.csv"
            target_column = "y"
        "#;
        assert!(matches!(
            Registry::from_toml_str(text),
            Err(EnsembleError::Config(_))
        ));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            Registry::from_toml_str("[[datasets]\nname ="),
            Err(EnsembleError::Config(_))
        ));
    }

    #[test]
    fn parses_full_registry() {
        let text = r#"
            [pipeline]
            meta_train_ratio = 0.7
            trials = 10
            strategy = "random"

            [storage]
            root = "/data"
            predictions = "{model}/{dataset}_{split}.json"

            [[datasets]]
            name = "Energy"
            path = "energy.csv"
            target_column = "AEP_MW"
            slice = { kind = "head", count = 5000 }
            lookback = 30

            [[models]]
            name = "LSTM"
            description = "stacked LSTM"

            [[models]]
            name = "XGBoost"
        "#;
        let registry = Registry::from_toml_str(text).unwrap();

        assert_eq!(registry.pipeline.meta_train_ratio, 0.7);
        assert_eq!(registry.pipeline.search.trials, 10);
        assert_eq!(registry.storage.root, std::path::PathBuf::from("/data"));
        assert_eq!(
            registry.storage.reference_rmse.as_deref(),
            Some("{model}/RMSE_{model}.json")
        );
        let energy = registry.dataset("Energy").unwrap();
        assert_eq!(energy.slice, SliceRule::Head { count: 5000 });
        assert_eq!(energy.lookback, 30);
        assert!(registry.check_model("XGBoost").is_ok());
        assert_eq!(
            registry.check_model("Prophet"),
            Err(EnsembleError::UnknownModel("Prophet".into()))
        );
    }
}
