//! Core data structures for ensemble selection.

mod matrix;
mod selection;

pub use matrix::PredictionMatrix;
pub use selection::Selection;
