//! `resale-flat` library crate.
//!
//! The binary (`resale`) is a thin wrapper around this library so that:
//!
//! - the feature pipeline is testable without a terminal or network
//! - the geocoder and model sit behind traits that tests can replace
//! - front-ends (CLI, TUI) stay presentation-only

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod tui;
