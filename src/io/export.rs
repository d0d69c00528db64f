//! Append prediction results to a CSV file.
//!
//! One row per prediction; the header is written only when the file is new
//! or empty, so repeated runs build up a single log.

use std::fs::OpenOptions;
use std::path::Path;

use chrono::Local;

use crate::app::pipeline::PredictionOutput;
use crate::error::AppError;

const HEADER: [&str; 15] = [
    "timestamp",
    "street_name",
    "block",
    "floor_area_sqm",
    "lease_commence_date",
    "storey_range",
    "latitude",
    "longitude",
    "cbd_dist",
    "min_dist_mrt",
    "floor_area_sqm_log",
    "lease_remain_years",
    "storey_median_log",
    "log_price",
    "price",
];

/// Append one prediction row to `path`.
pub fn append_prediction_csv(path: &Path, output: &PredictionOutput) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::runtime(format!("Failed to open export CSV '{}': {e}", path.display())))?;
    let is_new = file
        .metadata()
        .map(|m| m.len() == 0)
        .map_err(|e| AppError::runtime(format!("Failed to stat export CSV: {e}")))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if is_new {
        writer
            .write_record(HEADER)
            .map_err(|e| AppError::runtime(format!("Failed to write export CSV header: {e}")))?;
    }

    let req = &output.request;
    let d = &output.derivation;
    let f = d.features;
    writer
        .write_record([
            Local::now().to_rfc3339(),
            req.street_name.clone(),
            req.block.clone(),
            format!("{}", req.floor_area_sqm),
            req.lease_commence_date.to_string(),
            req.storey_range.clone(),
            format!("{:.6}", d.origin.latitude),
            format!("{:.6}", d.origin.longitude),
            format!("{:.3}", f.cbd_distance_m),
            format!("{:.3}", f.nearest_transit_distance_m),
            format!("{:.10}", f.floor_area_log),
            format!("{}", f.lease_remaining_years),
            format!("{:.10}", f.storey_median_log),
            format!("{:.10}", output.log_price),
            format!("{:.2}", output.price),
        ])
        .map_err(|e| AppError::runtime(format!("Failed to write export CSV row: {e}")))?;

    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush export CSV: {e}")))?;

    tracing::info!(path = %path.display(), "appended prediction");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::tests::sample_output;

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        let output = sample_output();

        append_prediction_csv(&path, &output).unwrap();
        append_prediction_csv(&path, &output).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,street_name,block"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp")).count(), 1);
        assert!(lines[1].contains("ANG MO KIO AVE 10"));
        assert!(lines[1].ends_with(&format!("{:.2}", output.price)));
    }
}
