//! Greedy forward selection (Caruana et al., 2004).
//!
//! Models are added one at a time, with replacement, to a running average
//! of predictions. At every step the model whose inclusion gives the lowest
//! RMSE against the ground truth wins. Picking the same model repeatedly
//! increases its weight in the final average.

use tracing::debug;

use crate::core::{PredictionMatrix, Selection};
use crate::error::{EnsembleError, Result};
use crate::utils::metrics::squared_error_sum;

/// Outcome of greedy selection on a training matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleFit {
    /// Running-average prediction after the final pick.
    pub prediction: Vec<f64>,
    /// Models picked, in order.
    pub selection: Selection,
    /// RMSE of the winning candidate at each step.
    pub step_rmse: Vec<f64>,
}

impl EnsembleFit {
    /// RMSE of the final ensemble on the data it was selected on.
    pub fn rmse(&self) -> f64 {
        // step_rmse always has one entry per pick
        self.step_rmse.last().copied().unwrap_or(f64::NAN)
    }
}

/// Run greedy ensemble selection for exactly `size` steps.
///
/// Each step folds every model's row into the current running average with
/// weight `1 / (k + 1)`, where `k` is the number of picks so far, and keeps
/// the candidate with the smallest RMSE. The scan is linear with a strict
/// comparison, so ties resolve to the lowest model index.
///
/// # Errors
/// * `InvalidBudget` if `size` is zero
/// * `ShapeMismatch` if `truth` does not match the matrix columns
/// * `ComputationError` if no candidate has a finite RMSE at some step
///
/// # Example
/// ```
/// use caruana_forecast::core::PredictionMatrix;
/// use caruana_forecast::ensemble::select;
///
/// let preds = PredictionMatrix::new(vec![
///     vec![1.0, 2.0, 3.0, 4.0],
///     vec![0.0, 0.0, 0.0, 0.0],
/// ]).unwrap();
/// let fit = select(&preds, &[1.0, 2.0, 3.0, 4.0], 2).unwrap();
///
/// assert_eq!(fit.selection.indices(), &[0, 0]);
/// assert_eq!(fit.rmse(), 0.0);
/// ```
pub fn select(preds: &PredictionMatrix, truth: &[f64], size: usize) -> Result<EnsembleFit> {
    if size == 0 {
        return Err(EnsembleError::zero_budget());
    }
    preds.check_truth(truth)?;

    let n_steps = preds.n_steps();
    let mut running = vec![0.0; n_steps];
    let mut candidate = vec![0.0; n_steps];
    let mut indices = Vec::with_capacity(size);
    let mut step_rmse = Vec::with_capacity(size);

    for k in 0..size {
        let kept = k as f64;
        let denom = kept + 1.0;

        let mut best: Option<(usize, f64)> = None;
        for (m, row) in preds.rows().enumerate() {
            fold_into(&mut candidate, &running, row, kept, denom);
            let score = (squared_error_sum(truth, &candidate) / n_steps as f64).sqrt();
            if !score.is_finite() {
                continue;
            }
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((m, score)),
            }
        }

        let (winner, score) = best.ok_or_else(|| {
            EnsembleError::ComputationError(format!(
                "no candidate produced a finite RMSE at selection step {}",
                k + 1
            ))
        })?;

        for (r, x) in running.iter_mut().zip(preds.row(winner)?) {
            *r = (*r * kept + x) / denom;
        }
        indices.push(winner);
        step_rmse.push(score);

        debug!(step = k + 1, model = winner, rmse = score, "greedy pick");
    }

    Ok(EnsembleFit {
        prediction: running,
        selection: Selection::new(indices, preds.n_models())?,
        step_rmse,
    })
}

/// `out = (running * kept + row) / denom`, element-wise.
#[inline]
fn fold_into(out: &mut [f64], running: &[f64], row: &[f64], kept: f64, denom: f64) {
    for ((o, r), x) in out.iter_mut().zip(running).zip(row) {
        *o = (r * kept + x) / denom;
    }
}
