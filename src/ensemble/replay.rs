//! Replaying a selection on a (possibly held-out) prediction matrix.

use crate::core::{PredictionMatrix, Selection};
use crate::error::{EnsembleError, Result};

/// Average the rows picked by `selection`, with multiplicity.
///
/// The matrix may have any number of columns, but its rows must follow the
/// same model order as the matrix the selection was built from. Replaying a
/// selection on its own training matrix reproduces the prediction returned by
/// [`select`](super::select) up to floating-point rounding.
///
/// # Errors
/// * `ShapeMismatch` if the matrix has a different number of models than the
///   selection was built for
///
/// # Example
/// ```
/// use caruana_forecast::core::{PredictionMatrix, Selection};
/// use caruana_forecast::ensemble::predict;
///
/// let test = PredictionMatrix::new(vec![vec![1.0, 1.0], vec![4.0, 7.0]]).unwrap();
/// let selection = Selection::new(vec![0, 1, 1], 2).unwrap();
///
/// assert_eq!(predict(&test, &selection).unwrap(), vec![3.0, 5.0]);
/// ```
pub fn predict(preds: &PredictionMatrix, selection: &Selection) -> Result<Vec<f64>> {
    if preds.n_models() != selection.n_models() {
        return Err(EnsembleError::ShapeMismatch {
            expected: selection.n_models(),
            got: preds.n_models(),
        });
    }

    let mut sum = vec![0.0; preds.n_steps()];
    let mut average = vec![0.0; preds.n_steps()];
    for (i, &model) in selection.indices().iter().enumerate() {
        let picked = (i + 1) as f64;
        for ((s, a), x) in sum.iter_mut().zip(average.iter_mut()).zip(preds.row(model)?) {
            *s += x;
            *a = *s / picked;
        }
    }

    Ok(average)
}
