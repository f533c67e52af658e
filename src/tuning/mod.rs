//! Ensemble-size tuning.
//!
//! [`SizeObjective`] scores an ensemble size on a meta-validation slice of
//! the training data; [`search`] minimises any [`Objective`] over an integer
//! [`SearchSpace`].

mod objective;
mod search;
mod surrogate;

pub use objective::{Objective, SizeObjective, DEFAULT_META_TRAIN_RATIO};
pub use search::{search, SearchConfig, SearchResult, SearchSpace, SearchStrategy, Trial};
