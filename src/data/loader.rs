//! Loading the target series and assembling pipeline inputs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info};

use super::registry::Registry;
use super::store::{PredictionStore, Split};
use crate::core::PredictionMatrix;
use crate::error::{EnsembleError, Result};
use crate::pipeline::EnsembleInputs;

/// Read one numeric column of a headed CSV file.
///
/// # Errors
/// * `Io` if the file cannot be opened
/// * `Parse` if the column is missing or a value is not a number
pub fn load_target_column(path: impl AsRef<Path>, column: &str) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EnsembleError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let col_idx = reader
        .headers()
        .map_err(|e| EnsembleError::parse(path, e))?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| EnsembleError::parse(path, format!("column '{column}' not found")))?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| EnsembleError::parse(path, e))?;
        let field = record.get(col_idx).unwrap_or("");
        let value = field.parse::<f64>().map_err(|_| {
            // +2: one for the header, one for 1-based rows
            EnsembleError::parse(
                path,
                format!("row {}: '{field}' in column '{column}' is not a number", row + 2),
            )
        })?;
        values.push(value);
    }

    debug!(path = %path.display(), column, len = values.len(), "loaded target column");
    Ok(values)
}

/// Assemble aligned inputs for `dataset` from the registry and a store.
///
/// The target is read from the dataset's CSV (relative to the storage root),
/// sliced and split; each model contributes one train and one test row.
///
/// # Errors
/// * `EmptyModelSet` if `models` is empty, before any file is touched
/// * `UnknownDataset` / `UnknownModel` for names missing from the registry
/// * `ShapeMismatch` if a model's predictions do not match the truth length
/// * any error raised by the store or the CSV loader
pub fn load_inputs<S>(
    registry: &Registry,
    dataset: &str,
    models: &[String],
    store: &S,
) -> Result<EnsembleInputs>
where
    S: PredictionStore + ?Sized,
{
    if models.is_empty() {
        return Err(EnsembleError::EmptyModelSet);
    }
    let spec = registry.dataset(dataset)?;
    for model in models {
        registry.check_model(model)?;
    }

    let raw = load_target_column(registry.storage.root.join(&spec.path), &spec.target_column)?;
    let (train_truth, test_truth) = spec.prepare_target(&raw)?;
    info!(
        dataset,
        raw = raw.len(),
        train = train_truth.len(),
        test = test_truth.len(),
        "prepared target"
    );

    let mut train_rows = Vec::with_capacity(models.len());
    let mut test_rows = Vec::with_capacity(models.len());
    let mut reference = Vec::with_capacity(models.len());
    for model in models {
        train_rows.push(store.predictions(dataset, model, Split::Train)?);
        test_rows.push(store.predictions(dataset, model, Split::Test)?);
        reference.push(store.reference_rmse(dataset, model)?);
    }

    let train = PredictionMatrix::new(train_rows)?;
    let test = PredictionMatrix::new(test_rows)?;
    EnsembleInputs::new(models.to_vec(), train, train_truth, test, test_truth)?
        .with_reference_rmse(reference)
}
