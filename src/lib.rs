//! # caruana-forecast
//!
//! Greedy (Caruana) ensemble selection over precomputed time series
//! forecasts, with the ensemble size tuned on a meta-validation split.
//!
//! Base models are treated as black boxes: each contributes one row of
//! predictions per split. The library picks models with replacement to
//! minimise the RMSE of their running average, searches the number of picks
//! with a seeded random or Gaussian-process strategy, and reports how the
//! tuned ensemble compares to every base model on the test split.

#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod pipeline;
pub mod tuning;
pub mod utils;

pub use error::{EnsembleError, Result};

pub mod prelude {
    pub use crate::core::{PredictionMatrix, Selection};
    pub use crate::ensemble::{predict, select, CaruanaEnsemble, EnsembleFit};
    pub use crate::error::{EnsembleError, Result};
    pub use crate::pipeline::{run, EnsembleInputs, EnsembleReport, PipelineConfig};
    pub use crate::tuning::{search, Objective, SearchConfig, SearchSpace, SearchStrategy};
    pub use crate::utils::{calculate_metrics, rmse, AccuracyMetrics};
}
