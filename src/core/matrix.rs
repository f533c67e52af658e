//! Prediction matrix holding one row of forecasts per base model.

use std::ops::Range;

use crate::error::{EnsembleError, Result};

/// Base-model predictions laid out as `n_models` rows of `n_steps` values.
///
/// Row order is the stable model index used by selections: row `i` always
/// belongs to the same base model for the lifetime of the matrix, and any
/// other matrix a selection is replayed on must keep that ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMatrix {
    rows: Vec<Vec<f64>>,
    n_steps: usize,
}

impl PredictionMatrix {
    /// Build a matrix from per-model prediction rows.
    ///
    /// # Errors
    /// * `EmptyModelSet` if `rows` is empty
    /// * `EmptyData` if the rows have no columns
    /// * `ShapeMismatch` if the rows differ in length
    ///
    /// # Example
    /// ```
    /// use caruana_forecast::core::PredictionMatrix;
    ///
    /// let preds = PredictionMatrix::new(vec![
    ///     vec![1.0, 2.0, 3.0],
    ///     vec![0.5, 1.5, 2.5],
    /// ]).unwrap();
    /// assert_eq!(preds.n_models(), 2);
    /// assert_eq!(preds.n_steps(), 3);
    /// ```
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let first = rows.first().ok_or(EnsembleError::EmptyModelSet)?;
        let n_steps = first.len();
        if n_steps == 0 {
            return Err(EnsembleError::EmptyData);
        }

        if let Some(row) = rows.iter().find(|r| r.len() != n_steps) {
            return Err(EnsembleError::ShapeMismatch {
                expected: n_steps,
                got: row.len(),
            });
        }

        Ok(Self { rows, n_steps })
    }

    /// Number of base models (rows).
    pub fn n_models(&self) -> usize {
        self.rows.len()
    }

    /// Number of time steps (columns).
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Predictions of the model at `index`.
    pub fn row(&self, index: usize) -> Result<&[f64]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(EnsembleError::IndexOutOfBounds {
                index,
                size: self.rows.len(),
            })
    }

    /// Iterate over model rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Copy of the given column range for every model.
    pub fn columns(&self, range: Range<usize>) -> Result<Self> {
        if range.end > self.n_steps {
            return Err(EnsembleError::IndexOutOfBounds {
                index: range.end,
                size: self.n_steps,
            });
        }
        if range.is_empty() {
            return Err(EnsembleError::EmptyData);
        }

        let rows = self.rows.iter().map(|r| r[range.clone()].to_vec()).collect();
        Ok(Self {
            rows,
            n_steps: range.len(),
        })
    }

    /// Split every row at column `at` into `[0, at)` and `[at, n_steps)`.
    pub fn split_at(&self, at: usize) -> Result<(Self, Self)> {
        Ok((self.columns(0..at)?, self.columns(at..self.n_steps)?))
    }

    /// Check that a truth sequence lines up with the matrix columns.
    pub fn check_truth(&self, truth: &[f64]) -> Result<()> {
        if truth.len() != self.n_steps {
            return Err(EnsembleError::ShapeMismatch {
                expected: self.n_steps,
                got: truth.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PredictionMatrix {
        PredictionMatrix::new(vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![5.0, 4.0, 3.0, 2.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty_model_set() {
        assert_eq!(
            PredictionMatrix::new(vec![]),
            Err(EnsembleError::EmptyModelSet)
        );
    }

    #[test]
    fn rejects_ragged_rows() {
        let result = PredictionMatrix::new(vec![vec![1.0, 2.0], vec![1.0]]);
        assert_eq!(
            result,
            Err(EnsembleError::ShapeMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn rejects_zero_columns() {
        let result = PredictionMatrix::new(vec![vec![], vec![]]);
        assert_eq!(result, Err(EnsembleError::EmptyData));
    }

    #[test]
    fn split_preserves_row_order() {
        let (head, tail) = sample().split_at(4).unwrap();
        assert_eq!(head.n_steps(), 4);
        assert_eq!(tail.n_steps(), 1);
        assert_eq!(head.row(1).unwrap(), &[5.0, 4.0, 3.0, 2.0]);
        assert_eq!(tail.row(0).unwrap(), &[5.0]);
    }

    #[test]
    fn split_at_boundary_fails() {
        assert!(matches!(sample().split_at(0), Err(EnsembleError::EmptyData)));
        assert!(matches!(sample().split_at(5), Err(EnsembleError::EmptyData)));
    }

    #[test]
    fn row_out_of_bounds() {
        assert_eq!(
            sample().row(2),
            Err(EnsembleError::IndexOutOfBounds { index: 2, size: 2 })
        );
    }

    #[test]
    fn truth_length_checked() {
        let preds = sample();
        assert!(preds.check_truth(&[0.0; 5]).is_ok());
        assert!(matches!(
            preds.check_truth(&[0.0; 4]),
            Err(EnsembleError::ShapeMismatch { expected: 5, got: 4 })
        ));
    }
}
