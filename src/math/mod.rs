//! Mathematical utilities: geodesic distances and medians.

pub mod geodesic;
pub mod stats;

pub use geodesic::*;
pub use stats::*;
