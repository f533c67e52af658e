//! Caruana ensemble selection.
//!
//! Builds an ensemble from precomputed base-model predictions by greedy
//! forward selection with replacement, and replays the resulting selection
//! on held-out predictions.

mod greedy;
mod model;
mod replay;

pub use greedy::{select, EnsembleFit};
pub use model::CaruanaEnsemble;
pub use replay::predict;
