//! Debug bundle writer for inspecting a single submission.
//!
//! The bundle is a Markdown file with the raw request, the geocoded origin,
//! the derived features (raw and scaled) and the model output.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::PredictionOutput;
use crate::domain::{FEATURE_NAMES, PipelineSettings};
use crate::error::AppError;
use crate::report::format_currency;

pub fn write_debug_bundle(output: &PredictionOutput, settings: &PipelineSettings) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), output, settings)
}

pub fn write_debug_bundle_in(
    dir: &Path,
    output: &PredictionOutput,
    settings: &PipelineSettings,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let block = sanitize(&output.request.block);
    let path = dir.join(format!("resale_debug_{block}_{ts}.md"));

    let mut file =
        File::create(&path).map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    write_bundle(&mut file, output, settings)
        .map_err(|e| AppError::runtime(format!("Failed to write debug bundle: {e}")))?;

    tracing::info!(path = %path.display(), "wrote debug bundle");
    Ok(path)
}

fn write_bundle(w: &mut impl Write, output: &PredictionOutput, settings: &PipelineSettings) -> std::io::Result<()> {
    let req = &output.request;
    let d = &output.derivation;

    writeln!(w, "# resale debug bundle")?;
    writeln!(w, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(w, "- lease_baseline_year: {}", settings.lease_baseline_year)?;
    writeln!(w, "- cbd: ({:.4}, {:.4})", settings.cbd.latitude, settings.cbd.longitude)?;

    writeln!(w, "\n## Request")?;
    writeln!(w, "- street_name: {}", req.street_name)?;
    writeln!(w, "- block: {}", req.block)?;
    writeln!(w, "- floor_area_sqm: {}", req.floor_area_sqm)?;
    writeln!(w, "- lease_commence_date: {}", req.lease_commence_date)?;
    writeln!(w, "- storey_range: {}", req.storey_range)?;

    writeln!(w, "\n## Geocoding")?;
    writeln!(w, "- query: {}", d.query_address)?;
    writeln!(w, "- matched: {}", d.matched_address.as_deref().unwrap_or("-"))?;
    writeln!(w, "- postal: {}", d.matched_postal.as_deref().unwrap_or("-"))?;
    writeln!(w, "- origin: ({:.6}, {:.6})", d.origin.latitude, d.origin.longitude)?;
    writeln!(
        w,
        "- nearest_station: ({:.6}, {:.6})",
        d.nearest_station.latitude, d.nearest_station.longitude
    )?;

    writeln!(w, "\n## Features")?;
    writeln!(w, "| feature | raw | scaled |")?;
    writeln!(w, "| - | - | - |")?;
    for (i, (name, raw)) in FEATURE_NAMES.iter().zip(d.features.to_array()).enumerate() {
        let scaled = output
            .scaled_features
            .get(i)
            .map(|v| format!("{v:.6}"))
            .unwrap_or_else(|| "-".to_string());
        writeln!(w, "| {name} | {raw:.6} | {scaled} |")?;
    }

    writeln!(w, "\n## Prediction")?;
    writeln!(w, "- log_price: {:.8}", output.log_price)?;
    writeln!(w, "- price: {}", format_currency(output.price))?;
    Ok(())
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
