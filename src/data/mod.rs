//! Datasets, stored base-model predictions and the registry tying them
//! together.

mod dataset;
mod loader;
mod registry;
mod store;

pub use dataset::{DatasetSpec, SliceRule, DEFAULT_LOOKBACK, DEFAULT_TRAIN_RATIO};
pub use loader::{load_inputs, load_target_column};
pub use registry::{ModelEntry, Registry};
pub use store::{JsonPredictionStore, PredictionStore, Split, StorageConfig};
