//! End-to-end run: tune the ensemble size, fit on full training data,
//! evaluate on the test split.

mod inputs;
mod report;

pub use inputs::EnsembleInputs;
pub use report::{EnsembleReport, ModelScore, ModelWeight, ScoreSource, ENSEMBLE_LABEL};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ensemble::{predict, select};
use crate::error::Result;
use crate::tuning::{search, SearchConfig, SearchSpace, SizeObjective, DEFAULT_META_TRAIN_RATIO};
use crate::utils::{calculate_metrics, rmse};

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Share of the training data used as meta-train while tuning.
    pub meta_train_ratio: f64,
    /// Upper bound of the size search; `None` means twice the model count.
    pub max_ensemble_size: Option<usize>,
    /// Search driver settings.
    #[serde(flatten)]
    pub search: SearchConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            meta_train_ratio: DEFAULT_META_TRAIN_RATIO,
            max_ensemble_size: None,
            search: SearchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the meta-train share used for tuning.
    pub fn with_meta_train_ratio(mut self, ratio: f64) -> Self {
        self.meta_train_ratio = ratio;
        self
    }

    /// Cap the ensemble size search at `max`.
    pub fn with_max_ensemble_size(mut self, max: usize) -> Self {
        self.max_ensemble_size = Some(max);
        self
    }

    /// Replace the search settings.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Size domain for `n_models` base models.
    pub fn search_space(&self, n_models: usize) -> Result<SearchSpace> {
        match self.max_ensemble_size {
            Some(max) => SearchSpace::new(1, max),
            None => SearchSpace::for_models(n_models),
        }
    }
}

/// Tune, fit and evaluate a Caruana ensemble.
///
/// 1. Search the ensemble size on a meta-train/meta-validation split of the
///    training data.
/// 2. Select an ensemble of that size on the full training data.
/// 3. Replay the selection on the test predictions.
/// 4. Compare against each base model's standalone test RMSE.
///
/// # Example
/// ```
/// use caruana_forecast::core::PredictionMatrix;
/// use caruana_forecast::pipeline::{run, EnsembleInputs, PipelineConfig};
/// use caruana_forecast::tuning::SearchConfig;
///
/// let truth: Vec<f64> = (0..20).map(|i| i as f64).collect();
/// let good: Vec<f64> = truth.iter().map(|t| t + 0.1).collect();
/// let bad = vec![0.0; 20];
/// let train = PredictionMatrix::new(vec![good[..15].to_vec(), bad[..15].to_vec()]).unwrap();
/// let test = PredictionMatrix::new(vec![good[15..].to_vec(), bad[15..].to_vec()]).unwrap();
///
/// let inputs = EnsembleInputs::new(
///     vec!["good".into(), "bad".into()],
///     train,
///     truth[..15].to_vec(),
///     test,
///     truth[15..].to_vec(),
/// ).unwrap();
/// let config = PipelineConfig::default().with_search(SearchConfig::new(4).with_seed(1));
///
/// let report = run(&inputs, &config).unwrap();
/// assert!(report.test_rmse() < 0.2);
/// assert_eq!(report.comparison.len(), 3);
/// ```
pub fn run(inputs: &EnsembleInputs, config: &PipelineConfig) -> Result<EnsembleReport> {
    let space = config.search_space(inputs.n_models())?;
    let objective = SizeObjective::new(inputs.train(), inputs.train_truth(), config.meta_train_ratio)?;
    info!(
        models = inputs.n_models(),
        meta_train = objective.meta_train_len(),
        meta_validation = objective.meta_validation_len(),
        "tuning ensemble size"
    );

    let tuning = search(&objective, space, &config.search)?;
    let size = tuning.best_budget;
    info!(size, validation_rmse = tuning.best_value, "selected ensemble size");

    let fit = select(inputs.train(), inputs.train_truth(), size)?;
    let test_predictions = predict(inputs.test(), &fit.selection)?;
    let train = calculate_metrics(inputs.train_truth(), &fit.prediction)?;
    let test = calculate_metrics(inputs.test_truth(), &test_predictions)?;
    info!(train_rmse = train.rmse, test_rmse = test.rmse, "ensemble evaluated");

    let weights = fit
        .selection
        .counts()
        .into_iter()
        .zip(fit.selection.weights())
        .zip(inputs.model_names())
        .map(|((count, weight), name)| ModelWeight {
            name: name.clone(),
            count,
            weight,
        })
        .collect();

    let mut comparison = Vec::with_capacity(inputs.n_models() + 1);
    for (i, name) in inputs.model_names().iter().enumerate() {
        let score = match inputs.reference_rmse()[i] {
            Some(stored) => ModelScore {
                name: name.clone(),
                rmse: stored,
                source: ScoreSource::Reference,
            },
            None => ModelScore {
                name: name.clone(),
                rmse: rmse(inputs.test_truth(), inputs.test().row(i)?)?,
                source: ScoreSource::Computed,
            },
        };
        comparison.push(score);
    }
    comparison.push(ModelScore {
        name: ENSEMBLE_LABEL.to_string(),
        rmse: test.rmse,
        source: ScoreSource::Ensemble,
    });

    Ok(EnsembleReport {
        ensemble_size: size,
        selection: fit.selection.indices().to_vec(),
        weights,
        train,
        test,
        train_predictions: fit.prediction,
        test_predictions,
        comparison,
        search: tuning,
    })
}
