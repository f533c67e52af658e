//! Fit/predict wrapper around greedy selection.

use crate::core::{PredictionMatrix, Selection};
use crate::error::{EnsembleError, Result};

use super::{predict, select, EnsembleFit};

/// Caruana ensemble with a fixed size budget.
///
/// `fit` runs greedy selection on a training matrix; `predict` replays the
/// stored selection on any matrix with the same model layout.
///
/// # Example
/// ```
/// use caruana_forecast::core::PredictionMatrix;
/// use caruana_forecast::ensemble::CaruanaEnsemble;
///
/// let train = PredictionMatrix::new(vec![vec![1.0, 2.0, 3.0], vec![3.0, 3.0, 3.0]]).unwrap();
/// let test = PredictionMatrix::new(vec![vec![4.0, 5.0], vec![3.0, 3.0]]).unwrap();
///
/// let mut ensemble = CaruanaEnsemble::new().with_size(3);
/// ensemble.fit(&train, &[1.0, 2.0, 3.0]).unwrap();
/// let forecast = ensemble.predict(&test).unwrap();
/// assert_eq!(forecast, vec![4.0, 5.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CaruanaEnsemble {
    /// Ensemble size; `None` means twice the number of models.
    size: Option<usize>,
    /// Result of the last fit.
    fit: Option<EnsembleFit>,
}

impl CaruanaEnsemble {
    /// Create an unfitted ensemble using the default size budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ensemble size budget.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Size budget that will be used for a matrix with `n_models` rows.
    pub fn size_for(&self, n_models: usize) -> usize {
        self.size.unwrap_or(2 * n_models)
    }

    /// Run greedy selection on the training data.
    pub fn fit(&mut self, preds: &PredictionMatrix, truth: &[f64]) -> Result<()> {
        let size = self.size_for(preds.n_models());
        self.fit = Some(select(preds, truth, size)?);
        Ok(())
    }

    /// Replay the fitted selection on `preds`.
    pub fn predict(&self, preds: &PredictionMatrix) -> Result<Vec<f64>> {
        let fit = self.fit.as_ref().ok_or(EnsembleError::FitRequired)?;
        predict(preds, &fit.selection)
    }

    /// In-sample ensemble prediction from the last fit.
    pub fn fitted_values(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.prediction.as_slice())
    }

    /// Selection from the last fit.
    pub fn selection(&self) -> Option<&Selection> {
        self.fit.as_ref().map(|f| &f.selection)
    }

    /// In-sample RMSE from the last fit.
    pub fn training_rmse(&self) -> Option<f64> {
        self.fit.as_ref().map(EnsembleFit::rmse)
    }

    /// Check if the ensemble has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> (PredictionMatrix, Vec<f64>) {
        let preds = PredictionMatrix::new(vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 2.0, 2.0],
            vec![0.0, 0.0, 9.0],
        ])
        .unwrap();
        (preds, vec![1.0, 2.0, 3.0])
    }

    #[test]
    fn default_size_is_twice_model_count() {
        let (preds, truth) = train();
        let mut ensemble = CaruanaEnsemble::new();
        ensemble.fit(&preds, &truth).unwrap();

        assert_eq!(ensemble.selection().unwrap().len(), 6);
        assert!(ensemble.is_fitted());
    }

    #[test]
    fn predict_before_fit_fails() {
        let (preds, _) = train();
        let ensemble = CaruanaEnsemble::new().with_size(2);
        assert_eq!(ensemble.predict(&preds), Err(EnsembleError::FitRequired));
        assert!(ensemble.fitted_values().is_none());
    }

    #[test]
    fn predict_replays_on_training_matrix() {
        let (preds, truth) = train();
        let mut ensemble = CaruanaEnsemble::new().with_size(3);
        ensemble.fit(&preds, &truth).unwrap();

        let replayed = ensemble.predict(&preds).unwrap();
        let fitted = ensemble.fitted_values().unwrap();
        for (a, b) in replayed.iter().zip(fitted.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(ensemble.training_rmse(), Some(0.0));
    }

    #[test]
    fn zero_size_fails_on_fit() {
        let (preds, truth) = train();
        let mut ensemble = CaruanaEnsemble::new().with_size(0);
        assert!(matches!(
            ensemble.fit(&preds, &truth),
            Err(EnsembleError::InvalidBudget { .. })
        ));
        assert!(!ensemble.is_fitted());
    }
}
