//! Ordered sequence of chosen base models.

use serde::Serialize;

use crate::error::{EnsembleError, Result};

/// Model indices picked by greedy selection, in pick order.
///
/// The same index may appear several times; each occurrence adds one more
/// share of that model to the running average. A selection remembers how many
/// models the matrix it was built from had, so it can only be replayed on a
/// matrix with the same row layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    indices: Vec<usize>,
    n_models: usize,
}

impl Selection {
    /// Create a selection over `n_models` base models.
    ///
    /// # Errors
    /// * `EmptyModelSet` if `n_models` is zero
    /// * `InvalidBudget` if `indices` is empty
    /// * `IndexOutOfBounds` if any index is not below `n_models`
    pub fn new(indices: Vec<usize>, n_models: usize) -> Result<Self> {
        if n_models == 0 {
            return Err(EnsembleError::EmptyModelSet);
        }
        if indices.is_empty() {
            return Err(EnsembleError::zero_budget());
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= n_models) {
            return Err(EnsembleError::IndexOutOfBounds {
                index,
                size: n_models,
            });
        }
        Ok(Self { indices, n_models })
    }

    /// Picked model indices in order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Ensemble size (number of picks, counting repeats).
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always false for a constructed selection.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of models the selection was built for.
    pub fn n_models(&self) -> usize {
        self.n_models
    }

    /// How often each model was picked, indexed by model.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_models];
        for &i in &self.indices {
            counts[i] += 1;
        }
        counts
    }

    /// Share of the final average contributed by each model.
    ///
    /// Weights sum to one; unpicked models get zero.
    pub fn weights(&self) -> Vec<f64> {
        let size = self.indices.len() as f64;
        self.counts().into_iter().map(|c| c as f64 / size).collect()
    }
}
