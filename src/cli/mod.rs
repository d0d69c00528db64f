//! Command-line parsing for the resale price predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{
    AppConfig, CBD_COORDINATE, DEFAULT_GEOCODER_TIMEOUT_SECS, DEFAULT_GEOCODER_URL, DEFAULT_LEASE_BASELINE_YEAR,
    PipelineSettings, PredictionRequest,
};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "resale", version, about = "Resale flat price predictor")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict the resale price for one flat and print a summary.
    Predict(PredictArgs),
    /// Print the derived feature vector without loading the model.
    Features(RequestArgs),
    /// List the selectable street addresses or block numbers.
    Choices(ChoicesArgs),
    /// Launch the interactive form.
    Tui,
}

/// Settings shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Reference dataset CSV (address, block_no, latitude, longitude).
    #[arg(long, global = true, env = "RESALE_REFERENCE_CSV", default_value = "df_coordinates.csv")]
    pub reference: PathBuf,

    /// Regression model artifact (JSON).
    #[arg(long, global = true, env = "RESALE_MODEL", default_value = "model.json")]
    pub model: PathBuf,

    /// Feature scaler artifact (JSON).
    #[arg(long, global = true, env = "RESALE_SCALER", default_value = "scaler.json")]
    pub scaler: PathBuf,

    /// Lease-policy baseline year used for remaining-lease years.
    #[arg(long, global = true, env = "RESALE_LEASE_BASELINE_YEAR", default_value_t = DEFAULT_LEASE_BASELINE_YEAR)]
    pub lease_baseline_year: i32,

    /// OneMap search endpoint.
    #[arg(long, global = true, env = "ONEMAP_SEARCH_URL", default_value = DEFAULT_GEOCODER_URL)]
    pub geocoder_url: String,

    /// Geocoder request timeout in seconds.
    #[arg(long, global = true, env = "RESALE_GEOCODER_TIMEOUT_SECS", default_value_t = DEFAULT_GEOCODER_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Resolve addresses from the reference dataset instead of OneMap.
    #[arg(long, global = true)]
    pub offline: bool,
}

/// Raw form values for one flat.
#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// Street name, e.g. "ANG MO KIO AVE 10".
    #[arg(long)]
    pub street: String,

    /// Block number, e.g. "406".
    #[arg(long)]
    pub block: String,

    /// Floor area in square meters, (0, 500].
    #[arg(long)]
    pub floor_area: f64,

    /// Lease commencement year.
    #[arg(long)]
    pub lease_commence: i32,

    /// Storey range, e.g. "10 TO 12".
    #[arg(long)]
    pub storey_range: String,

    /// Print JSON instead of the text summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Append the result to a CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChoiceKind {
    Addresses,
    Blocks,
}

#[derive(Debug, Args, Clone)]
pub struct ChoicesArgs {
    #[arg(value_enum)]
    pub kind: ChoiceKind,
}

impl RequestArgs {
    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest {
            street_name: self.street.clone(),
            block: self.block.clone(),
            floor_area_sqm: self.floor_area,
            lease_commence_date: self.lease_commence,
            storey_range: self.storey_range.clone(),
        }
    }
}

impl CommonArgs {
    /// Resolve flags + environment into an `AppConfig`.
    pub fn to_config(&self) -> Result<AppConfig, AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::config("--timeout-secs must be at least 1."));
        }
        if self.lease_baseline_year < crate::domain::LEASE_COMMENCE_MIN {
            return Err(AppError::config(format!(
                "--lease-baseline-year {} is before the earliest lease year.",
                self.lease_baseline_year
            )));
        }

        Ok(AppConfig {
            reference_csv: self.reference.clone(),
            model_path: self.model.clone(),
            scaler_path: self.scaler.clone(),
            geocoder_url: self.geocoder_url.clone(),
            geocoder_timeout: Duration::from_secs(self.timeout_secs),
            geocoder_token: std::env::var("ONEMAP_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            offline: self.offline,
            pipeline: PipelineSettings {
                lease_baseline_year: self.lease_baseline_year,
                cbd: CBD_COORDINATE,
            },
        })
    }
}
