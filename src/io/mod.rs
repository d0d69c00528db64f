//! Input/output helpers.
//!
//! - reference dataset loading (`reference`)
//! - model/scaler artifact loading (`artifact`)
//! - prediction CSV export (`export`)

pub mod artifact;
pub mod export;
pub mod reference;

pub use artifact::*;
pub use export::*;
pub use reference::*;
