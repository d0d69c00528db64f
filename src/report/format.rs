//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::PredictionOutput;
use crate::domain::FEATURE_NAMES;
use crate::error::{AppError, ErrorKind};
use crate::features::Derivation;

/// Prompt shown after any failed submission.
pub const RETRY_PROMPT: &str = "Enter the above values to get the predicted resale price of the flat.";

/// Format a price as `$1,234,567.89`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

/// Full prediction summary for `resale predict`.
pub fn format_prediction(output: &PredictionOutput) -> String {
    let mut out = String::new();
    out.push_str("=== resale - Resale Flat Price Prediction ===\n");
    out.push_str(&format_derivation(&output.derivation));
    out.push_str(&format!(
        "\nScaled:   [{}]\n",
        output
            .scaled_features
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!("Log-price: {:.6}\n", output.log_price));
    out.push_str(&format!("\nPredicted resale price: {}\n", format_currency(output.price)));
    out
}

/// Feature table for `resale features` (and the top half of a prediction).
pub fn format_derivation(d: &Derivation) -> String {
    let mut out = String::new();
    out.push_str(&format!("Address:  {}\n", d.query_address));
    if let Some(matched) = &d.matched_address {
        out.push_str(&format!("Matched:  {matched}\n"));
    }
    if let Some(postal) = &d.matched_postal {
        out.push_str(&format!("Postal:   {postal}\n"));
    }
    out.push_str(&format!(
        "Origin:   ({:.6}, {:.6})\n",
        d.origin.latitude, d.origin.longitude
    ));
    out.push_str(&format!(
        "Nearest station: ({:.6}, {:.6})\n",
        d.nearest_station.latitude, d.nearest_station.longitude
    ));
    out.push_str(&format!(
        "Lease remaining: {} years | storey median: {}\n",
        d.lease_remaining_years, d.storey_median
    ));

    out.push_str("\nFeatures:\n");
    for (name, value) in FEATURE_NAMES.iter().zip(d.features.to_array()) {
        out.push_str(&format!("  {name:<20} {value:>14.4}\n"));
    }
    out
}

/// User-facing failure text: the error, a hint for the kind, and a prompt to
/// retry.
///
/// Configuration and dataset failures happen before any form exists, so they
/// get no retry prompt.
pub fn format_failure(err: &AppError) -> String {
    let mut out = format!("Error occurred: {err}");

    let hint = match err.kind() {
        ErrorKind::Config | ErrorKind::DataLoad => return out,
        _ if err.is_retryable() => Some("The geocoding service may be temporarily unavailable; try again."),
        ErrorKind::ModelArtifact => Some("Check the --model and --scaler artifacts."),
        _ => None,
    };
    if let Some(hint) = hint {
        out.push('\n');
        out.push_str(hint);
    }
    out.push('\n');
    out.push_str(RETRY_PROMPT);
    out
}
