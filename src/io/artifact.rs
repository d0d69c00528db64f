//! Read model and scaler artifacts.
//!
//! Both artifacts are JSON documents tagged by `kind` (see `models::scaler`
//! and `models::regressor` for the schemas). They are loaded once at startup
//! and validated against the pipeline's feature width before use.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::{FeatureScaler, ModelArtifacts, RegressionModel};

/// Load and validate the scaler + model pair.
pub fn load_model_artifacts(model_path: &Path, scaler_path: &Path) -> Result<ModelArtifacts, AppError> {
    let scaler: FeatureScaler = read_json(scaler_path, "scaler")?;
    let model: RegressionModel = read_json(model_path, "model")?;
    let artifacts = ModelArtifacts::new(scaler, model)?;

    tracing::info!(
        model = %model_path.display(),
        scaler = %scaler_path.display(),
        kind = %artifacts.model().display_name(),
        "loaded model artifacts"
    );
    Ok(artifacts)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::model_artifact(format!("Failed to open {what} artifact '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::model_artifact(format!("Invalid {what} artifact '{}': {e}", path.display()))
    })
}
