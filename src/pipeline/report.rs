//! Results of a pipeline run, ready for rendering.

use std::fmt;

use serde::Serialize;

use crate::tuning::SearchResult;
use crate::utils::AccuracyMetrics;

/// Label used for the ensemble row of the comparison.
pub const ENSEMBLE_LABEL: &str = "Caruana Ensemble";

/// Where a comparison score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Stored score supplied with the base model.
    Reference,
    /// Computed from the model's test predictions.
    Computed,
    /// The tuned ensemble itself.
    Ensemble,
}

/// One bar of the model comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub name: String,
    pub rmse: f64,
    pub source: ScoreSource,
}

/// Share of the final ensemble held by one base model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelWeight {
    pub name: String,
    pub count: usize,
    pub weight: f64,
}

/// Everything the presentation layer needs from a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleReport {
    /// Tuned ensemble size.
    pub ensemble_size: usize,
    /// Model indices picked on the full training data, in order.
    pub selection: Vec<usize>,
    /// Per-model pick counts and weights.
    pub weights: Vec<ModelWeight>,
    /// Ensemble accuracy on the training split.
    pub train: AccuracyMetrics,
    /// Ensemble accuracy on the test split.
    pub test: AccuracyMetrics,
    /// Ensemble predictions on the training split.
    pub train_predictions: Vec<f64>,
    /// Ensemble predictions on the test split.
    pub test_predictions: Vec<f64>,
    /// Standalone base-model RMSE followed by the ensemble's test RMSE.
    pub comparison: Vec<ModelScore>,
    /// Search history for the ensemble size.
    pub search: SearchResult,
}

impl EnsembleReport {
    /// Training RMSE of the final ensemble.
    pub fn train_rmse(&self) -> f64 {
        self.train.rmse
    }

    /// Test RMSE of the final ensemble.
    pub fn test_rmse(&self) -> f64 {
        self.test.rmse
    }
}

impl fmt::Display for EnsembleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ensemble size: {}", self.ensemble_size)?;
        writeln!(f, "Train RMSE:    {:.6}", self.train.rmse)?;
        writeln!(f, "Test RMSE:     {:.6}", self.test.rmse)?;
        writeln!(f)?;
        writeln!(f, "{:<24} {:>8} {:>8}", "Model", "Picks", "Weight")?;
        for w in &self.weights {
            writeln!(f, "{:<24} {:>8} {:>8.3}", w.name, w.count, w.weight)?;
        }
        writeln!(f)?;
        writeln!(f, "{:<24} {:>14} {:>10}", "Model", "RMSE", "Source")?;
        for score in &self.comparison {
            let source = match score.source {
                ScoreSource::Reference => "stored",
                ScoreSource::Computed => "computed",
                ScoreSource::Ensemble => "ensemble",
            };
            writeln!(f, "{:<24} {:>14.6} {:>10}", score.name, score.rmse, source)?;
        }
        Ok(())
    }
}
