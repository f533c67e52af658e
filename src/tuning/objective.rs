//! Validation objective for tuning the ensemble size.

use tracing::debug;

use crate::core::PredictionMatrix;
use crate::ensemble::{predict, select};
use crate::error::{EnsembleError, Result};
use crate::utils::rmse;

/// Default share of the training data used as meta-train.
pub const DEFAULT_META_TRAIN_RATIO: f64 = 0.8;

/// Scalar function of an ensemble size budget, to be minimised.
///
/// Implementations must be deterministic for a given budget; the search
/// driver caches values and may evaluate budgets from several threads.
pub trait Objective: Sync {
    /// Score the given ensemble size (lower is better).
    fn evaluate(&self, budget: usize) -> Result<f64>;
}

impl<F> Objective for F
where
    F: Fn(usize) -> Result<f64> + Sync,
{
    fn evaluate(&self, budget: usize) -> Result<f64> {
        self(budget)
    }
}

/// Meta-validation RMSE of a greedy ensemble built on meta-train.
///
/// The training data is split once, by time, into a meta-train prefix and a
/// meta-validation suffix. Each evaluation selects an ensemble of the given
/// size on the prefix and scores its replay on the suffix. Held-out test
/// data never enters the objective.
#[derive(Debug, Clone)]
pub struct SizeObjective {
    meta_train: PredictionMatrix,
    meta_train_truth: Vec<f64>,
    meta_validation: PredictionMatrix,
    meta_validation_truth: Vec<f64>,
}

impl SizeObjective {
    /// Split training predictions and truth at `floor(ratio * len)`.
    ///
    /// # Errors
    /// * `ShapeMismatch` if `truth` does not match the matrix columns
    /// * `InvalidParameter` if `ratio` is not strictly between 0 and 1
    /// * `InsufficientData` if either partition would be empty
    pub fn new(preds: &PredictionMatrix, truth: &[f64], ratio: f64) -> Result<Self> {
        preds.check_truth(truth)?;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(EnsembleError::InvalidParameter(format!(
                "meta-train ratio must be in (0, 1), got {ratio}"
            )));
        }

        let len = truth.len();
        let split = (len as f64 * ratio).floor() as usize;
        if split == 0 || split == len {
            return Err(EnsembleError::InsufficientData {
                needed: min_len_for_ratio(ratio),
                got: len,
            });
        }

        let (meta_train, meta_validation) = preds.split_at(split)?;
        Ok(Self {
            meta_train,
            meta_train_truth: truth[..split].to_vec(),
            meta_validation,
            meta_validation_truth: truth[split..].to_vec(),
        })
    }

    /// Number of base models available to the objective.
    pub fn n_models(&self) -> usize {
        self.meta_train.n_models()
    }

    /// Length of the meta-train partition.
    pub fn meta_train_len(&self) -> usize {
        self.meta_train_truth.len()
    }

    /// Length of the meta-validation partition.
    pub fn meta_validation_len(&self) -> usize {
        self.meta_validation_truth.len()
    }
}

impl Objective for SizeObjective {
    fn evaluate(&self, budget: usize) -> Result<f64> {
        let fit = select(&self.meta_train, &self.meta_train_truth, budget)?;
        let validation = predict(&self.meta_validation, &fit.selection)?;
        let score = rmse(&self.meta_validation_truth, &validation)?;
        debug!(budget, meta_train_rmse = fit.rmse(), score, "size objective");
        Ok(score)
    }
}

/// Smallest series length for which both partitions are non-empty.
///
/// `floor(n * ratio) >= 1` first holds near `ceil(1 / ratio)`; the exact
/// value is found by checking a few lengths around that estimate.
fn min_len_for_ratio(ratio: f64) -> usize {
    let splits = |n: usize| {
        let split = (n as f64 * ratio).floor() as usize;
        split > 0 && split < n
    };
    // Saturating cast: a tiny ratio maps to usize::MAX.
    let estimate = (1.0 / ratio).ceil() as usize;
    let start = estimate.saturating_sub(1).max(2);
    (0..64)
        .filter_map(|step| start.checked_add(step))
        .find(|&n| splits(n))
        .unwrap_or(estimate.max(2))
}
