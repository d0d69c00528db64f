//! Feature scalers fitted alongside the regression model.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Column-wise affine scaler.
///
/// - `standard`: `(x - mean) / scale`
/// - `min_max`: `x * scale + min`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl FeatureScaler {
    pub fn n_features(&self) -> usize {
        match self {
            FeatureScaler::Standard { scale, .. } | FeatureScaler::MinMax { scale, .. } => scale.len(),
        }
    }

    /// Check internal consistency and the expected input width.
    pub fn validate(&self, n_features: usize) -> Result<(), AppError> {
        let (offset, scale, offset_name) = match self {
            FeatureScaler::Standard { mean, scale } => (mean, scale, "mean"),
            FeatureScaler::MinMax { min, scale } => (min, scale, "min"),
        };

        if offset.len() != scale.len() {
            return Err(AppError::model_artifact(format!(
                "Scaler `{offset_name}` has {} entries but `scale` has {}.",
                offset.len(),
                scale.len()
            )));
        }
        if scale.len() != n_features {
            return Err(AppError::model_artifact(format!(
                "Scaler expects {} features, pipeline produces {n_features}.",
                scale.len()
            )));
        }
        if offset.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::model_artifact("Scaler contains non-finite parameters."));
        }
        if let FeatureScaler::Standard { scale, .. } = self {
            if let Some(idx) = scale.iter().position(|s| *s == 0.0) {
                return Err(AppError::model_artifact(format!("Scaler `scale[{idx}]` is zero.")));
            }
        }
        Ok(())
    }

    /// Scale a batch (one sample per row).
    pub fn transform(&self, batch: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if batch.ncols() != self.n_features() {
            return Err(AppError::model_artifact(format!(
                "Scaler expects {} columns, got {}.",
                self.n_features(),
                batch.ncols()
            )));
        }

        let mut out = batch.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            match self {
                FeatureScaler::Standard { mean, scale } => {
                    col.apply(|x| *x = (*x - mean[j]) / scale[j]);
                }
                FeatureScaler::MinMax { min, scale } => {
                    col.apply(|x| *x = *x * scale[j] + min[j]);
                }
            }
        }
        Ok(out)
    }
}
