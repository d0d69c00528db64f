//! Price prediction capability.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::domain::{FEATURE_COUNT, FeatureVector};
use crate::error::AppError;
use crate::models::{FeatureScaler, RegressionModel};

/// Model output for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutput {
    /// The vector after the scaler, as fed to the regressor.
    pub scaled: Vec<f64>,
    /// Predicted natural log of the resale price.
    pub log_price: f64,
}

pub trait Predictor {
    fn predict_log_price(&self, features: &FeatureVector) -> Result<ModelOutput, AppError>;
}

/// Scaler + regressor pair, validated once at load time.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    scaler: FeatureScaler,
    model: RegressionModel,
}

impl ModelArtifacts {
    pub fn new(scaler: FeatureScaler, model: RegressionModel) -> Result<Self, AppError> {
        scaler.validate(FEATURE_COUNT)?;
        model.validate(FEATURE_COUNT)?;
        Ok(Self { scaler, model })
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    /// Scale then predict a batch of raw feature rows.
    pub fn predict_batch(&self, batch: &DMatrix<f64>) -> Result<(DMatrix<f64>, DVector<f64>), AppError> {
        let scaled = self.scaler.transform(batch)?;
        let y = self.model.predict(&scaled);
        Ok((scaled, y))
    }
}

impl Predictor for ModelArtifacts {
    fn predict_log_price(&self, features: &FeatureVector) -> Result<ModelOutput, AppError> {
        let batch = DMatrix::from_row_slice(1, FEATURE_COUNT, &features.to_array());
        let (scaled, y) = self.predict_batch(&batch)?;

        let log_price = y[0];
        if !log_price.is_finite() {
            return Err(AppError::model_artifact("Model produced a non-finite prediction."));
        }

        Ok(ModelOutput {
            scaled: scaled.row(0).iter().copied().collect(),
            log_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn features() -> FeatureVector {
        FeatureVector {
            cbd_distance_m: 10_000.0,
            nearest_transit_distance_m: 500.0,
            floor_area_log: 90.0_f64.ln(),
            lease_remaining_years: 66.0,
            storey_median_log: 11.0_f64.ln(),
        }
    }

    #[test]
    fn scales_then_predicts() {
        let scaler = FeatureScaler::Standard {
            mean: vec![10_000.0, 500.0, 0.0, 60.0, 0.0],
            scale: vec![1_000.0, 100.0, 1.0, 6.0, 1.0],
        };
        let model = RegressionModel::Linear {
            coefficients: vec![0.0, 0.0, 1.0, 1.0, 0.0],
            intercept: 12.0,
        };
        let artifacts = ModelArtifacts::new(scaler, model).unwrap();

        let out = artifacts.predict_log_price(&features()).unwrap();
        assert_eq!(out.scaled[0], 0.0);
        assert_eq!(out.scaled[3], 1.0);
        assert!((out.log_price - (12.0 + 90.0_f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn width_mismatch_is_rejected_at_construction() {
        let scaler = FeatureScaler::Standard {
            mean: vec![0.0; 5],
            scale: vec![1.0; 5],
        };
        let model = RegressionModel::Linear {
            coefficients: vec![1.0; 6],
            intercept: 0.0,
        };
        let err = ModelArtifacts::new(scaler, model).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelArtifact);
    }
}
