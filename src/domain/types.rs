//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - passed between the pipeline and the front-ends
//! - written to CSV exports and debug bundles
//! - printed as JSON by the CLI

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Leasehold term for resale flats, in years.
pub const LEASE_TERM_YEARS: i32 = 99;

/// Lease-policy baseline year the model was trained against.
pub const DEFAULT_LEASE_BASELINE_YEAR: i32 = 2023;

/// Earliest accepted lease commencement year.
pub const LEASE_COMMENCE_MIN: i32 = 1960;

/// Largest accepted floor area (square meters).
pub const FLOOR_AREA_MAX_SQM: f64 = 500.0;

/// Literal separator inside a storey range such as `"07 TO 09"`.
pub const STOREY_SEPARATOR: &str = " TO ";

/// Central Business District reference point.
pub const CBD_COORDINATE: GeoPoint = GeoPoint {
    latitude: 1.2830,
    longitude: 103.8513,
};

/// OneMap elastic search endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://www.onemap.gov.sg/api/common/elastic/search";

pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One row of the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub address: String,
    pub block: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Coordinate of a known transit (MRT) station.
pub type TransitStationCoordinate = GeoPoint;

/// Raw form input for a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub street_name: String,
    pub block: String,
    pub floor_area_sqm: f64,
    pub lease_commence_date: i32,
    /// Free text in the `"<int> TO <int>"` form.
    pub storey_range: String,
}

impl PredictionRequest {
    /// Address string sent to the geocoder: `block + " " + street`.
    pub fn query_address(&self) -> String {
        format!("{} {}", self.block.trim(), self.street_name.trim())
    }
}

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 5;

/// Column names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "cbd_dist",
    "min_dist_mrt",
    "floor_area_sqm_log",
    "lease_remain_years",
    "storey_median_log",
];

/// Model input in the exact trained field order.
///
/// Order: CBD distance (m), nearest transit distance (m), ln(floor area),
/// lease remaining years, ln(storey median).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub cbd_distance_m: f64,
    pub nearest_transit_distance_m: f64,
    pub floor_area_log: f64,
    pub lease_remaining_years: f64,
    pub storey_median_log: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.cbd_distance_m,
            self.nearest_transit_distance_m,
            self.floor_area_log,
            self.lease_remaining_years,
            self.storey_median_log,
        ]
    }
}

/// Settings that change feature semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub lease_baseline_year: i32,
    pub cbd: GeoPoint,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            lease_baseline_year: DEFAULT_LEASE_BASELINE_YEAR,
            cbd: CBD_COORDINATE,
        }
    }
}

/// Resolved run configuration (CLI flags + environment).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reference_csv: PathBuf,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub geocoder_token: Option<String>,
    pub offline: bool,
    pub pipeline: PipelineSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_address_joins_block_then_street() {
        let req = PredictionRequest {
            street_name: " ANG MO KIO AVE 10 ".to_string(),
            block: "406".to_string(),
            floor_area_sqm: 44.0,
            lease_commence_date: 1979,
            storey_range: "10 TO 12".to_string(),
        };
        assert_eq!(req.query_address(), "406 ANG MO KIO AVE 10");
    }

    #[test]
    fn feature_array_keeps_model_order() {
        let v = FeatureVector {
            cbd_distance_m: 1.0,
            nearest_transit_distance_m: 2.0,
            floor_area_log: 3.0,
            lease_remaining_years: 4.0,
            storey_median_log: 5.0,
        };
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(1.3, 103.8).is_valid());
        assert!(!GeoPoint::new(91.0, 103.8).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
