//! Feature derivation.
//!
//! - `lease`: remaining lease years against a fixed baseline year
//! - `storey`: median storey from a `"a TO b"` range
//! - `derive`: the full request → `FeatureVector` pipeline

pub mod derive;
pub mod lease;
pub mod storey;

pub use derive::{Derivation, assemble, derive, derive_detailed, validate_request};
pub use lease::lease_remaining_years;
pub use storey::storey_median;
