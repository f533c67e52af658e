//! Aligned train/test inputs for a pipeline run.

use crate::core::PredictionMatrix;
use crate::error::{EnsembleError, Result};

/// Base-model predictions and ground truth for one dataset.
///
/// Row `i` of both matrices belongs to `model_names[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleInputs {
    model_names: Vec<String>,
    train: PredictionMatrix,
    train_truth: Vec<f64>,
    test: PredictionMatrix,
    test_truth: Vec<f64>,
    reference_rmse: Vec<Option<f64>>,
}

impl EnsembleInputs {
    /// Bundle train and test data, checking that everything lines up.
    ///
    /// # Errors
    /// * `EmptyModelSet` if `model_names` is empty
    /// * `ShapeMismatch` if the name count, matrix row counts or truth
    ///   lengths disagree
    pub fn new(
        model_names: Vec<String>,
        train: PredictionMatrix,
        train_truth: Vec<f64>,
        test: PredictionMatrix,
        test_truth: Vec<f64>,
    ) -> Result<Self> {
        if model_names.is_empty() {
            return Err(EnsembleError::EmptyModelSet);
        }
        for matrix in [&train, &test] {
            if matrix.n_models() != model_names.len() {
                return Err(EnsembleError::ShapeMismatch {
                    expected: model_names.len(),
                    got: matrix.n_models(),
                });
            }
        }
        train.check_truth(&train_truth)?;
        test.check_truth(&test_truth)?;

        let reference_rmse = vec![None; model_names.len()];
        Ok(Self {
            model_names,
            train,
            train_truth,
            test,
            test_truth,
            reference_rmse,
        })
    }

    /// Attach stored standalone RMSE scores, one slot per model.
    pub fn with_reference_rmse(mut self, scores: Vec<Option<f64>>) -> Result<Self> {
        if scores.len() != self.model_names.len() {
            return Err(EnsembleError::ShapeMismatch {
                expected: self.model_names.len(),
                got: scores.len(),
            });
        }
        self.reference_rmse = scores;
        Ok(self)
    }

    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn n_models(&self) -> usize {
        self.model_names.len()
    }

    pub fn train(&self) -> &PredictionMatrix {
        &self.train
    }

    pub fn train_truth(&self) -> &[f64] {
        &self.train_truth
    }

    pub fn test(&self) -> &PredictionMatrix {
        &self.test
    }

    pub fn test_truth(&self) -> &[f64] {
        &self.test_truth
    }

    pub fn reference_rmse(&self) -> &[Option<f64>] {
        &self.reference_rmse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize) -> PredictionMatrix {
        PredictionMatrix::new(vec![vec![0.0; cols]; rows]).unwrap()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    #[test]
    fn accepts_aligned_inputs() {
        let inputs =
            EnsembleInputs::new(names(2), matrix(2, 5), vec![0.0; 5], matrix(2, 3), vec![0.0; 3])
                .unwrap();
        assert_eq!(inputs.n_models(), 2);
        assert_eq!(inputs.reference_rmse(), &[None, None]);
    }

    #[test]
    fn rejects_empty_names() {
        let result =
            EnsembleInputs::new(vec![], matrix(1, 5), vec![0.0; 5], matrix(1, 3), vec![0.0; 3]);
        assert_eq!(result, Err(EnsembleError::EmptyModelSet));
    }

    #[test]
    fn rejects_row_count_mismatch_between_splits() {
        let result =
            EnsembleInputs::new(names(2), matrix(2, 5), vec![0.0; 5], matrix(3, 3), vec![0.0; 3]);
        assert_eq!(
            result,
            Err(EnsembleError::ShapeMismatch {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn rejects_misaligned_truth() {
        let result =
            EnsembleInputs::new(names(1), matrix(1, 5), vec![0.0; 4], matrix(1, 3), vec![0.0; 3]);
        assert!(matches!(result, Err(EnsembleError::ShapeMismatch { .. })));
    }

    #[test]
    fn reference_scores_must_cover_every_model() {
        let inputs =
            EnsembleInputs::new(names(2), matrix(2, 5), vec![0.0; 5], matrix(2, 3), vec![0.0; 3])
                .unwrap();
        assert!(inputs.clone().with_reference_rmse(vec![Some(1.0)]).is_err());
        let inputs = inputs.with_reference_rmse(vec![Some(1.0), None]).unwrap();
        assert_eq!(inputs.reference_rmse(), &[Some(1.0), None]);
    }
}
