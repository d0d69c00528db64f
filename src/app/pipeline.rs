//! Shared "predict" pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate -> geocode -> derive features -> scale -> predict -> exp
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::sync::Arc;

use serde::Serialize;

use crate::data::{CachingGeocoder, Geocoder, OneMapClient, ReferenceGeocoder};
use crate::domain::{AppConfig, PipelineSettings, PredictionRequest};
use crate::error::{AppError, ErrorKind};
use crate::features::{Derivation, derive_detailed};
use crate::io::artifact::load_model_artifacts;
use crate::io::reference::ReferenceStore;
use crate::models::Predictor;

/// All computed outputs of a single prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutput {
    pub request: PredictionRequest,
    pub derivation: Derivation,
    pub scaled_features: Vec<f64>,
    pub log_price: f64,
    /// `exp(log_price)`; the model is trained on log resale price.
    pub price: f64,
}

/// Derive features and run them through the model.
pub fn run_prediction(
    request: &PredictionRequest,
    geocoder: &dyn Geocoder,
    store: &ReferenceStore,
    predictor: &dyn Predictor,
    settings: &PipelineSettings,
) -> Result<PredictionOutput, AppError> {
    let derivation = derive_detailed(request, geocoder, store, settings)?;
    let model_out = predictor.predict_log_price(&derivation.features)?;

    let price = model_out.log_price.exp();
    if !price.is_finite() {
        return Err(AppError::model_artifact(format!(
            "Predicted log-price {} does not map to a finite price.",
            model_out.log_price
        )));
    }

    tracing::info!(
        query = %derivation.query_address,
        log_price = model_out.log_price,
        price,
        "prediction"
    );

    Ok(PredictionOutput {
        request: request.clone(),
        derivation,
        scaled_features: model_out.scaled,
        log_price: model_out.log_price,
        price,
    })
}

/// Long-lived collaborators, built once at startup.
///
/// The reference store and the model are read-only for the process lifetime.
/// A model that failed to load is kept as its error so the form can still
/// start; each submission that needs it reports the failure.
pub struct Services {
    pub store: Arc<ReferenceStore>,
    pub geocoder: Box<dyn Geocoder>,
    pub predictor: Result<Arc<dyn Predictor>, AppError>,
    pub settings: PipelineSettings,
}

impl Services {
    /// Load reference data (fatal on failure) and, optionally, the model.
    pub fn from_config(config: &AppConfig, load_model: bool) -> Result<Self, AppError> {
        let store = Arc::new(ReferenceStore::load(&config.reference_csv)?);

        let geocoder: Box<dyn Geocoder> = if config.offline {
            tracing::info!("using offline geocoder");
            Box::new(ReferenceGeocoder::new(Arc::clone(&store)))
        } else {
            Box::new(CachingGeocoder::new(OneMapClient::from_config(config)?))
        };

        let predictor: Result<Arc<dyn Predictor>, AppError> = if load_model {
            load_model_artifacts(&config.model_path, &config.scaler_path).map(|a| Arc::new(a) as Arc<dyn Predictor>)
        } else {
            Err(AppError::model_artifact("Model not loaded for this command."))
        };
        if let Err(err) = &predictor {
            if load_model {
                tracing::error!(%err, "model artifacts unavailable");
            }
        }

        Ok(Self {
            store,
            geocoder,
            predictor,
            settings: config.pipeline,
        })
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutput, AppError> {
        let predictor = self.predictor.as_ref().map_err(Clone::clone)?;
        let result = run_prediction(
            request,
            &*self.geocoder,
            &self.store,
            &**predictor,
            &self.settings,
        );
        if let Err(err) = &result {
            log_failure(err);
        }
        result
    }

    pub fn derive(&self, request: &PredictionRequest) -> Result<Derivation, AppError> {
        let result = derive_detailed(request, &*self.geocoder, &self.store, &self.settings);
        if let Err(err) = &result {
            log_failure(err);
        }
        result
    }
}

fn log_failure(err: &AppError) {
    match err.kind() {
        ErrorKind::ModelArtifact | ErrorKind::DataLoad => tracing::error!(%err, "submission failed"),
        ErrorKind::GeocodingUnavailable => tracing::warn!(%err, "submission failed"),
        _ => tracing::info!(%err, "submission rejected"),
    }
}
