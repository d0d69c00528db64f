//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - reference data rows (`LocationRecord`, `TransitStationCoordinate`)
//! - the per-submission input (`PredictionRequest`)
//! - the model input contract (`FeatureVector`)
//! - resolved configuration (`AppConfig`, `PipelineSettings`)

pub mod types;

pub use types::*;
