//! Model artifacts: feature scaler, regressor and the `Predictor` seam.
//!
//! Models are small, pure data structures decoded from JSON so the pipeline
//! stays independent of how they were trained.

pub mod predictor;
pub mod regressor;
pub mod scaler;

pub use predictor::*;
pub use regressor::*;
pub use scaler::*;
