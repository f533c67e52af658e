//! Utility functions for evaluating ensembles.

pub mod metrics;

pub use metrics::{calculate_metrics, mae, mse, rmse, AccuracyMetrics};
