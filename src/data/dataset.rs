//! Dataset slicing and train/test splitting of the target series.

use serde::{Deserialize, Serialize};

use crate::error::{EnsembleError, Result};

/// Default share of the (sliced) series used for training.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Default number of leading points dropped from each split.
pub const DEFAULT_LOOKBACK: usize = 60;

/// Which rows of the raw target series a dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SliceRule {
    /// Every row.
    #[default]
    All,
    /// The first `count` rows.
    Head { count: usize },
    /// The last `count` rows.
    Tail { count: usize },
    /// Every `step`-th row, starting with the first.
    Stride { step: usize },
}

impl SliceRule {
    /// Apply the rule to a raw series.
    pub fn apply(&self, values: &[f64]) -> Result<Vec<f64>> {
        let sliced = match *self {
            SliceRule::All => values.to_vec(),
            SliceRule::Head { count } => values[..count.min(values.len())].to_vec(),
            SliceRule::Tail { count } => values[values.len().saturating_sub(count)..].to_vec(),
            SliceRule::Stride { step } => {
                if step == 0 {
                    return Err(EnsembleError::InvalidParameter(
                        "stride step must be positive".into(),
                    ));
                }
                values.iter().copied().step_by(step).collect()
            }
        };
        Ok(sliced)
    }
}

/// A registered dataset: where its target lives and how to cut it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Name used to select the dataset and to locate predictions.
    pub name: String,
    /// CSV file holding the target series, relative to the storage root.
    pub path: String,
    /// Header of the target column.
    pub target_column: String,
    #[serde(default)]
    pub slice: SliceRule,
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    /// Points each base model needs before its first prediction.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

fn default_train_ratio() -> f64 {
    DEFAULT_TRAIN_RATIO
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

impl DatasetSpec {
    /// Create a spec with default slicing, split ratio and lookback.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            target_column: target_column.into(),
            slice: SliceRule::All,
            train_ratio: DEFAULT_TRAIN_RATIO,
            lookback: DEFAULT_LOOKBACK,
        }
    }

    /// Set the slicing rule.
    pub fn with_slice(mut self, slice: SliceRule) -> Self {
        self.slice = slice;
        self
    }

    /// Set the lookback window.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    /// Set the train share of the sliced series.
    pub fn with_train_ratio(mut self, ratio: f64) -> Self {
        self.train_ratio = ratio;
        self
    }

    /// Slice the raw target and split it into aligned train and test truth.
    ///
    /// The sliced series is cut at `floor(len * train_ratio)`; each part then
    /// loses its first `lookback` points, matching base-model predictions
    /// that start once a full input window is available.
    ///
    /// # Errors
    /// * `InvalidParameter` for a ratio outside (0, 1) or a zero stride
    /// * `InsufficientData` if either part is not longer than `lookback`
    pub fn prepare_target(&self, raw: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(EnsembleError::InvalidParameter(format!(
                "train ratio for dataset '{}' must be in (0, 1), got {}",
                self.name, self.train_ratio
            )));
        }

        let series = self.slice.apply(raw)?;
        let split = (series.len() as f64 * self.train_ratio).floor() as usize;
        let (train, test) = series.split_at(split);

        for part in [train, test] {
            if part.len() <= self.lookback {
                return Err(EnsembleError::InsufficientData {
                    needed: self.lookback + 1,
                    got: part.len(),
                });
            }
        }

        Ok((
            train[self.lookback..].to_vec(),
            test[self.lookback..].to_vec(),
        ))
    }
}
