//! Accuracy metrics for forecast evaluation.

use serde::Serialize;

use crate::error::{EnsembleError, Result};

/// Accuracy metrics for a single prediction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Example
/// ```
/// use caruana_forecast::utils::calculate_metrics;
///
/// let metrics = calculate_metrics(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap();
/// assert!((metrics.rmse - 1.0).abs() < 1e-12);
/// assert!((metrics.mae - 1.0).abs() < 1e-12);
/// ```
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    let mse = mse(actual, predicted)?;
    Ok(AccuracyMetrics {
        mae: mae(actual, predicted)?,
        mse,
        rmse: mse.sqrt(),
    })
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(EnsembleError::ShapeMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(EnsembleError::EmptyData);
    }
    Ok(())
}

/// Sum of squared differences, without length checks.
#[inline]
pub(crate) fn squared_error_sum(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum()
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(squared_error_sum(actual, predicted) / actual.len() as f64)
}

/// Root mean squared error between two equal-length slices.
///
/// The metric is symmetric, so argument order does not change the result.
///
/// # Errors
/// * `ShapeMismatch` if the lengths differ
/// * `EmptyData` if both slices are empty
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    mse(actual, predicted).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn calculate_metrics_perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let metrics = calculate_metrics(&actual, &actual).unwrap();

        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mse, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn calculate_metrics_known_values() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = vec![1.5, 2.5, 2.5, 4.5, 4.5];

        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 0.5, epsilon = 1e-10);
        assert_relative_eq!(metrics.mse, 0.25, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn rmse_dimension_mismatch() {
        let result = rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert_eq!(
            result,
            Err(EnsembleError::ShapeMismatch {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn rmse_empty_data() {
        assert_eq!(rmse(&[], &[]), Err(EnsembleError::EmptyData));
    }

    #[test]
    fn standalone_rmse() {
        assert_relative_eq!(
            rmse(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap(),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn rmse_is_symmetric() {
        let a = [1.0, 4.0, -2.0];
        let b = [0.5, 3.0, 1.0];
        assert_relative_eq!(rmse(&a, &b).unwrap(), rmse(&b, &a).unwrap());
    }

    #[test]
    fn rmse_of_offset_series() {
        // Every step off by 2 -> RMSE 2
        let actual = [10.0, 20.0, 30.0, 40.0];
        let predicted = [12.0, 18.0, 32.0, 38.0];
        assert_relative_eq!(rmse(&actual, &predicted).unwrap(), 2.0, epsilon = 1e-12);
    }
}
